// CLASSIFICATION: COMMUNITY
// Filename: matcher.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Classification of incoming calls against the active rule generation.

use log::trace;

use super::group::PolicyGroup;
use super::rule::{PolicyRule, PolicyType};
use crate::config::{FallbackPair, TokenMatch};
use crate::pool::work::{CallFlags, IncomingCall, ProcName};

/// Decides the priority flags of a call. Pure: the same call against the
/// same generation always yields the same flags.
#[derive(Debug, Clone, Default)]
pub struct PolicyMatcher {
    token_match: TokenMatch,
    fallback: Option<(ProcName, ProcName)>,
}

impl PolicyMatcher {
    pub fn new(token_match: TokenMatch, fallback: Option<&FallbackPair>) -> Self {
        Self {
            token_match,
            fallback: fallback
                .map(|pair| (ProcName::new(&pair.client), ProcName::new(&pair.server))),
        }
    }

    pub fn token_match(&self) -> TokenMatch {
        self.token_match
    }

    /// First rule matching the call's token, if any.
    pub fn matched_rule<'g>(&self, call: &IncomingCall, group: &'g PolicyGroup) -> Option<&'g PolicyRule> {
        group.find(&call.token, self.token_match)
    }

    pub fn classify(&self, call: &IncomingCall, group: &PolicyGroup) -> CallFlags {
        let Some(rule) = self.matched_rule(call, group) else {
            if self.is_fallback(call) {
                trace!("fallback pair {} -> {} forced VIP", call.from.name, call.to.name);
                return (call.flags - CallFlags::PRIORITY) | CallFlags::VIP;
            }
            return call.flags - CallFlags::PRIORITY;
        };

        let passes = rule.accepts_code(call.code)
            && rule.accepts_server(&call.to.name)
            && rule.accepts_client(&call.from.name);
        let cleared = call.flags - CallFlags::PRIORITY;
        let flags = match rule.policy_type() {
            PolicyType::FlagMask if !call.flags.intersects(CallFlags::PRIORITY) => call.flags,
            PolicyType::FlagMask if passes => call.flags,
            PolicyType::All if passes => cleared | CallFlags::PRIORITY,
            PolicyType::VipThreadOnly if passes => cleared | CallFlags::VIP,
            _ => cleared,
        };
        trace!(
            "rule {} ({:?}) on {} code {} {} -> {}: {:?}",
            rule.index(),
            rule.policy_type(),
            call.token,
            call.code,
            call.from.name,
            call.to.name,
            flags
        );
        flags
    }

    fn is_fallback(&self, call: &IncomingCall) -> bool {
        self.fallback
            .as_ref()
            .map_or(false, |(client, server)| {
                *client == call.from.name && *server == call.to.name
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::group::Generation;
    use crate::policy::rule::RuleSpec;
    use crate::pool::work::ProcRef;

    fn group(specs: &[RuleSpec]) -> PolicyGroup {
        let mut group = PolicyGroup::new(Generation::Default);
        for (i, spec) in specs.iter().enumerate() {
            group.try_push(PolicyRule::from_spec(spec, i).unwrap()).unwrap();
        }
        group
    }

    fn call(token: &str, code: u32, client: &str, server: &str) -> IncomingCall {
        IncomingCall::new(
            token,
            code,
            ProcRef::new(2000, 10100, client),
            ProcRef::new(1000, 1000, server),
        )
    }

    #[test]
    fn vip_thread_only_sets_vip_alone() {
        let g = group(&[RuleSpec::new("a.IFoo", &[], PolicyType::VipThreadOnly)]);
        let m = PolicyMatcher::default();
        let flags = m.classify(&call("a.IFoo", 1, "c", "s").with_flags(CallFlags::URGENT), &g);
        assert_eq!(flags, CallFlags::VIP);
    }

    #[test]
    fn failed_filter_strips_priority() {
        let g = group(&[RuleSpec::new("a.IFoo", &[3], PolicyType::All)]);
        let m = PolicyMatcher::default();
        let c = call("a.IFoo", 4, "c", "s").with_flags(CallFlags::PRIORITY | CallFlags::ONEWAY);
        assert_eq!(m.classify(&c, &g), CallFlags::ONEWAY);
    }

    #[test]
    fn fallback_pair_only_when_configured() {
        let g = group(&[]);
        let c = call("x.IBar", 1, "sfhangtest", "surfaceflinger");
        assert_eq!(PolicyMatcher::default().classify(&c, &g), CallFlags::empty());
        let pair = FallbackPair {
            client: "sfhangtest".into(),
            server: "surfaceflinger".into(),
        };
        let m = PolicyMatcher::new(TokenMatch::Exact, Some(&pair));
        assert_eq!(m.classify(&c, &g), CallFlags::VIP);
        let urgent = c.with_flags(CallFlags::URGENT | CallFlags::ONEWAY);
        assert_eq!(m.classify(&urgent, &g), CallFlags::VIP | CallFlags::ONEWAY);
    }
}
