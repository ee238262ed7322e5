// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! VIP thread reservation and dispatch for RPC worker pools.
//!
//! A small number of pool threads are held back for calls that a rule table
//! marks as latency-critical; ordinary work never lands on them.

/// Policy configuration and its TOML loader
pub mod config;

/// Operator control plane
pub mod control;

/// Thread choice for new work items
pub mod dispatcher;

/// Error types
pub mod error;

/// Rule records, generations, store and classifier
pub mod policy;

/// Reference host pool and its hook trait
pub mod pool;

/// Reserved thread accounting
pub mod reservation;

/// Work selection for polling threads
pub mod selector;

/// The policy wired into the host pool hooks
pub mod vip;

pub use config::{ReservationMode, TokenMatch, VipConfig};
pub use control::{LoadMode, LoadReport, PolicyControl};
pub use error::{RuleError, VipError, VipResult};
pub use vip::{PolicyGate, VipPolicy};
