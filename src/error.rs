// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Error types shared by the policy store, matcher and control plane.

use thiserror::Error;

use crate::policy::Generation;
use crate::pool::PoolError;

/// Reasons a single rule record is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule has an empty interface token")]
    MissingToken,
    #[error("interface token is {len} bytes, limit is {max}")]
    TokenTooLong { len: usize, max: usize },
    #[error("unknown policy type {0}")]
    UnknownPolicyType(i64),
    #[error("invalid transaction code {0:?}")]
    InvalidCode(String),
    #[error("malformed rule line: {0}")]
    MalformedLine(String),
}

/// A rule rejected during a bulk load, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    pub position: usize,
    pub reason: RuleError,
}

/// Errors surfaced by policy operations.
#[derive(Debug, Error)]
pub enum VipError {
    #[error("{} of the submitted rules are malformed", .0.len())]
    InvalidRules(Vec<RejectedRule>),
    #[error("out of memory while staging rules")]
    Allocation,
    #[error("generation {0:?} is active and cannot be rebuilt")]
    ActiveGeneration(Generation),
    #[error("unknown policy generation {0}")]
    UnknownGeneration(u32),
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
    #[error("rule file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub type VipResult<T> = Result<T, VipError>;
