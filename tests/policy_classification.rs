// CLASSIFICATION: COMMUNITY
// Filename: policy_classification.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

use std::sync::Arc;

use vipthread::policy::{PolicyType, RuleSpec};
use vipthread::pool::{token_from_parcel, CallFlags, IncomingCall, ProcRef};
use vipthread::{LoadMode, PolicyControl, TokenMatch, VipConfig, VipPolicy};

fn control(config: VipConfig, rules: &[RuleSpec]) -> PolicyControl {
    let _ = env_logger::builder().is_test(true).try_init();
    let policy = Arc::new(VipPolicy::new(&config).unwrap());
    let control = PolicyControl::new(policy);
    control.submit_rules(rules, LoadMode::Atomic).unwrap();
    control
}

fn enabled() -> VipConfig {
    VipConfig {
        enabled: true,
        ..VipConfig::default()
    }
}

fn call(token: &str, code: u32, client: &str, server: &str) -> IncomingCall {
    IncomingCall::new(
        token,
        code,
        ProcRef::new(3100, 10150, client),
        ProcRef::new(1200, 1000, server),
    )
}

#[test]
fn all_rule_marks_vip_and_urgent() {
    let ctl = control(enabled(), &[RuleSpec::new("pkg.IFoo", &[], PolicyType::All)]);
    let flags = ctl
        .policy()
        .classify_call(&call("pkg.IFoo", 7, "app", "server"))
        .unwrap();
    assert_eq!(flags, CallFlags::VIP | CallFlags::URGENT);
}

#[test]
fn flag_mask_clears_caller_priority_when_code_misses() {
    let ctl = control(enabled(), &[RuleSpec::new("pkg.IFoo", &[1, 2], PolicyType::FlagMask)]);
    let c = call("pkg.IFoo", 5, "app", "server").with_flags(CallFlags::VIP);
    assert_eq!(ctl.policy().classify_call(&c).unwrap(), CallFlags::empty());

    let c = call("pkg.IFoo", 2, "app", "server").with_flags(CallFlags::VIP);
    assert_eq!(ctl.policy().classify_call(&c).unwrap(), CallFlags::VIP);

    let c = call("pkg.IFoo", 2, "app", "server");
    assert_eq!(ctl.policy().classify_call(&c).unwrap(), CallFlags::empty());
}

#[test]
fn process_name_filters_apply_in_order() {
    let rule = RuleSpec::new("pkg.IFoo", &[3], PolicyType::All)
        .server("system_server")
        .client("launcher");
    let ctl = control(enabled(), &[rule]);
    let policy = ctl.policy();

    let hit = call("pkg.IFoo", 3, "launcher", "system_server");
    assert_eq!(policy.classify_call(&hit).unwrap(), CallFlags::PRIORITY);
    let wrong_server = call("pkg.IFoo", 3, "launcher", "surfaceflinger");
    assert_eq!(policy.classify_call(&wrong_server).unwrap(), CallFlags::empty());
    let wrong_client = call("pkg.IFoo", 3, "settings", "system_server");
    assert_eq!(policy.classify_call(&wrong_client).unwrap(), CallFlags::empty());
}

#[test]
fn unmatched_token_drops_priority_but_keeps_other_flags() {
    let ctl = control(enabled(), &[RuleSpec::new("pkg.IFoo", &[], PolicyType::All)]);
    let c = call("pkg.IBar", 1, "app", "server")
        .with_flags(CallFlags::VIP | CallFlags::URGENT | CallFlags::ONEWAY);
    assert_eq!(ctl.policy().classify_call(&c).unwrap(), CallFlags::ONEWAY);
}

#[test]
fn classification_is_deterministic() {
    let rules = [
        RuleSpec::new("pkg.IFoo", &[1], PolicyType::VipThreadOnly),
        RuleSpec::new("pkg.IFoo", &[], PolicyType::All),
        RuleSpec::new("pkg.IBar", &[4, 5], PolicyType::FlagMask).server("server"),
    ];
    let ctl = control(enabled(), &rules);
    let calls = [
        call("pkg.IFoo", 1, "a", "server"),
        call("pkg.IFoo", 2, "a", "server").with_flags(CallFlags::URGENT),
        call("pkg.IBar", 4, "a", "server").with_flags(CallFlags::VIP),
        call("pkg.IBaz", 4, "a", "server").with_flags(CallFlags::VIP),
    ];
    for c in &calls {
        let first = ctl.policy().classify_call(c).unwrap();
        for _ in 0..16 {
            assert_eq!(ctl.policy().classify_call(c).unwrap(), first);
        }
    }
}

#[test]
fn disabled_gate_strips_caller_priority() {
    let ctl = control(VipConfig::default(), &[RuleSpec::new("pkg.IFoo", &[], PolicyType::All)]);
    assert!(!ctl.enabled());
    let c = call("pkg.IFoo", 1, "app", "server")
        .with_flags(CallFlags::VIP | CallFlags::URGENT | CallFlags::ONEWAY);
    assert_eq!(ctl.policy().classify_call(&c).unwrap(), CallFlags::ONEWAY);

    ctl.set_enabled(true);
    assert_eq!(
        ctl.policy().classify_call(&c).unwrap(),
        CallFlags::ONEWAY | CallFlags::PRIORITY
    );
}

#[test]
fn prefix_mode_matches_truncated_parcel_token() {
    let token = "android.hardware.graphics.composer3.IComposerCallbackExtendedWithLongName";
    let mut parcel = vec![0u8; 16];
    for b in token.bytes() {
        parcel.extend_from_slice(&[b, 0]);
    }
    let hint = token_from_parcel(&parcel);
    assert!(hint.len() < token.len());

    let rules = [RuleSpec::new(token, &[], PolicyType::All)];
    let exact = control(enabled(), &rules);
    assert_eq!(
        exact.policy().classify_call(&call(&hint, 1, "a", "b")).unwrap(),
        CallFlags::empty()
    );

    let prefix = control(
        VipConfig {
            token_match: TokenMatch::Prefix,
            ..enabled()
        },
        &rules,
    );
    assert_eq!(
        prefix.policy().classify_call(&call(&hint, 1, "a", "b")).unwrap(),
        CallFlags::PRIORITY
    );
}

#[test]
fn canned_groups_classify_known_interfaces() {
    let _ = env_logger::builder().is_test(true).try_init();
    let policy = Arc::new(
        VipPolicy::new(&VipConfig {
            preload_canned: true,
            ..enabled()
        })
        .unwrap(),
    );
    let ctl = PolicyControl::new(policy);
    let am = call("android.app.IActivityManager", 25, "app", "system_server");
    assert_eq!(ctl.policy().classify_call(&am).unwrap(), CallFlags::PRIORITY);

    ctl.switch_group(1).unwrap();
    assert_eq!(ctl.policy().classify_call(&am).unwrap(), CallFlags::empty());
    let organizer = call("android.window.ITaskOrganizer", 2, "system_server", "launcher");
    assert_eq!(
        ctl.policy().classify_call(&organizer).unwrap(),
        CallFlags::PRIORITY
    );
}
