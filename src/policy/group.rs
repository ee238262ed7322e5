// CLASSIFICATION: COMMUNITY
// Filename: group.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Rule generations and the canned rule sets.

use once_cell::sync::Lazy;

use super::rule::{PolicyRule, PolicyType, RuleSpec};
use crate::config::TokenMatch;
use crate::error::VipError;
use crate::pool::work::ProcName;

/// One of the two rule slots of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// General-purpose rules.
    Default,
    /// Rules used while switching between applications.
    AppSwitch,
}

impl Generation {
    pub fn id(self) -> u32 {
        match self {
            Generation::Default => 0,
            Generation::AppSwitch => 1,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self.id() as usize
    }

    /// The other slot.
    pub fn other(self) -> Generation {
        match self {
            Generation::Default => Generation::AppSwitch,
            Generation::AppSwitch => Generation::Default,
        }
    }
}

impl TryFrom<u32> for Generation {
    type Error = VipError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Generation::Default),
            1 => Ok(Generation::AppSwitch),
            other => Err(VipError::UnknownGeneration(other)),
        }
    }
}

static DEFAULT_RULES: Lazy<Vec<RuleSpec>> = Lazy::new(|| {
    vec![
        RuleSpec::new("android.app.IActivityManager", &[25], PolicyType::All),
        RuleSpec::new("android.gui.IWindowInfosListener", &[1], PolicyType::All)
            .server("system_server"),
        RuleSpec::new("android.gui.IWindowInfosPublisher", &[1], PolicyType::All)
            .server("surfaceflinger"),
    ]
});

static APP_SWITCH_RULES: Lazy<Vec<RuleSpec>> = Lazy::new(|| {
    vec![
        RuleSpec::new("android.app.IActivityManager", &[25], PolicyType::FlagMask),
        RuleSpec::new("android.window.ITaskOrganizer", &[1, 2], PolicyType::All),
        RuleSpec::new("android.view.IRemoteAnimationRunner", &[4, 9], PolicyType::All),
    ]
});

/// Ordered rule list of one generation.
#[derive(Debug, Clone)]
pub struct PolicyGroup {
    generation: Generation,
    rules: Vec<PolicyRule>,
}

impl PolicyGroup {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            rules: Vec::new(),
        }
    }

    /// Canned records for a generation.
    pub fn canned(generation: Generation) -> &'static [RuleSpec] {
        match generation {
            Generation::Default => DEFAULT_RULES.as_slice(),
            Generation::AppSwitch => APP_SWITCH_RULES.as_slice(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule whose token matches the hint.
    pub fn find(&self, hint: &str, mode: TokenMatch) -> Option<&PolicyRule> {
        self.rules
            .iter()
            .find(|rule| mode.matches(rule.interface_token(), hint))
    }

    /// Whether any rule names `name` as its serving process.
    pub fn serves(&self, name: &ProcName) -> bool {
        !name.is_empty() && self.rules.iter().any(|rule| rule.server() == name)
    }

    pub(crate) fn try_push(&mut self, rule: PolicyRule) -> Result<(), VipError> {
        self.rules
            .try_reserve(1)
            .map_err(|_| VipError::Allocation)?;
        self.rules.push(rule);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_sets_validate() {
        for generation in [Generation::Default, Generation::AppSwitch] {
            for (i, spec) in PolicyGroup::canned(generation).iter().enumerate() {
                assert!(PolicyRule::from_spec(spec, i).is_ok(), "{spec:?}");
            }
        }
    }

    #[test]
    fn generation_ids() {
        assert_eq!(Generation::try_from(1).unwrap(), Generation::AppSwitch);
        assert_eq!(Generation::Default.other(), Generation::AppSwitch);
        assert!(matches!(
            Generation::try_from(2),
            Err(VipError::UnknownGeneration(2))
        ));
    }

    #[test]
    fn first_match_wins() {
        let mut group = PolicyGroup::new(Generation::Default);
        let a = RuleSpec::new("android.app.IActivityManager", &[1], PolicyType::All);
        let b = RuleSpec::new("android.app.IActivityManager", &[2], PolicyType::FlagMask);
        group.try_push(PolicyRule::from_spec(&a, 0).unwrap()).unwrap();
        group.try_push(PolicyRule::from_spec(&b, 1).unwrap()).unwrap();
        let hit = group
            .find("android.app.IActivityManager", TokenMatch::Exact)
            .unwrap();
        assert_eq!(hit.index(), 0);
        assert!(group.find("android.app", TokenMatch::Exact).is_none());
        assert!(group.find("android.app", TokenMatch::Prefix).is_some());
    }
}
