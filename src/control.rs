// CLASSIFICATION: COMMUNITY
// Filename: control.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Operator surface: rule loads, generation switches, the global gate and
//! reservation overrides.

use std::sync::Arc;

use log::{info, warn};

use crate::error::{RejectedRule, VipError, VipResult};
use crate::policy::{Generation, PolicyRule, RuleSpec};
use crate::vip::VipPolicy;

/// How a bulk load treats malformed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Any malformed record rejects the whole load.
    #[default]
    Atomic,
    /// Skip malformed records and publish the rest.
    BestEffort,
}

/// Outcome of a published load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub generation: Generation,
    pub loaded: usize,
    pub rejected: Vec<RejectedRule>,
}

/// Control plane bound to a shared policy.
#[derive(Debug, Clone)]
pub struct PolicyControl {
    policy: Arc<VipPolicy>,
}

impl PolicyControl {
    pub fn new(policy: Arc<VipPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Arc<VipPolicy> {
        &self.policy
    }

    // === Rule loads ===

    /// Replace the rule table. Records are validated before the staging
    /// generation is touched; the new table goes live in one swap.
    pub fn submit_rules(&self, specs: &[RuleSpec], mode: LoadMode) -> VipResult<LoadReport> {
        let mut rules = Vec::with_capacity(specs.len());
        let mut rejected = Vec::new();
        for (position, spec) in specs.iter().enumerate() {
            match PolicyRule::from_spec(spec, rules.len()) {
                Ok(rule) => rules.push(rule),
                Err(reason) => {
                    warn!("rule {position} ({}) rejected: {reason}", spec.interface_token);
                    rejected.push(RejectedRule { position, reason });
                }
            }
        }
        if mode == LoadMode::Atomic && !rejected.is_empty() {
            return Err(VipError::InvalidRules(rejected));
        }

        let mut rebuild = self.policy.store().begin_rebuild_inactive()?;
        for rule in rules {
            rebuild.add_rule(rule)?;
        }
        let loaded = rebuild.len();
        let generation = rebuild.commit()?;
        info!(
            "loaded {loaded} rules into {generation:?}, {} rejected",
            rejected.len()
        );
        Ok(LoadReport {
            generation,
            loaded,
            rejected,
        })
    }

    /// Load rules from a JSON array of rule records.
    pub fn submit_json(&self, json: &str, mode: LoadMode) -> VipResult<LoadReport> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json)?;
        self.submit_rules(&specs, mode)
    }

    /// Publish an empty generation.
    pub fn clear_rules(&self) -> VipResult<Generation> {
        let generation = self.policy.store().begin_rebuild_inactive()?.commit()?;
        info!("rule table cleared, {generation:?} active");
        Ok(generation)
    }

    /// Insert or replace (by token) a single rule given in line form.
    pub fn upsert_rule_line(&self, line: &str) -> VipResult<LoadReport> {
        let spec = RuleSpec::parse_line(line)?;
        PolicyRule::from_spec(&spec, 0)?;
        let mut specs: Vec<RuleSpec> = self
            .policy
            .store()
            .read()?
            .rules()
            .iter()
            .map(PolicyRule::to_spec)
            .collect();
        let token = spec.interface_token.trim().to_owned();
        match specs.iter_mut().find(|s| s.interface_token == token) {
            Some(existing) => *existing = spec,
            None => specs.push(spec),
        }
        self.submit_rules(&specs, LoadMode::Atomic)
    }

    /// The active table, one `token,codes,client,server,type,handle,index`
    /// line per rule.
    pub fn rule_lines(&self) -> VipResult<Vec<String>> {
        Ok(self
            .policy
            .store()
            .read()?
            .rules()
            .iter()
            .map(PolicyRule::to_string)
            .collect())
    }

    // === Generations ===

    pub fn switch_group(&self, id: u32) -> VipResult<Generation> {
        let generation = Generation::try_from(id)?;
        self.policy.store().switch_to(generation)?;
        Ok(generation)
    }

    pub fn active_group(&self) -> VipResult<Generation> {
        self.policy.store().active_generation()
    }

    // === Gate ===

    pub fn set_enabled(&self, enabled: bool) {
        self.policy.gate().set_enabled(enabled);
        info!("VIP policy {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn enabled(&self) -> bool {
        self.policy.gate().is_enabled()
    }

    pub fn set_trace(&self, trace: bool) {
        self.policy.gate().set_trace(trace);
    }

    pub fn trace(&self) -> bool {
        self.policy.gate().trace()
    }

    // === Reservations ===

    /// Takes effect at the process's next pool resize.
    pub fn set_reservation_override(&self, process: &str, count: usize) -> VipResult<()> {
        self.policy.tracker().set_override(process, count)
    }

    pub fn clear_reservation_override(&self, process: &str) -> VipResult<Option<usize>> {
        self.policy.tracker().clear_override(process)
    }
}
