// CLASSIFICATION: COMMUNITY
// Filename: config_loading.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

use std::{env, fs};

use serial_test::serial;
use tempfile::tempdir;
use vipthread::config::{ConfigError, CONFIG_ENV};
use vipthread::{ReservationMode, TokenMatch, VipConfig};

const FULL: &str = r#"
enabled = true
trace = true
reservation_mode = "keep_last"
default_reserved = 2
token_match = "prefix"
preload_canned = true

[app_reservation]
min_uid = 10000
max_uid = 19999
min_threads = 4

[fallback_pair]
client = "sfhangtest"
server = "surfaceflinger"

[overrides]
system_server = 3
"#;

fn restore(prev: Option<String>) {
    match prev {
        Some(v) => env::set_var(CONFIG_ENV, v),
        None => env::remove_var(CONFIG_ENV),
    }
}

#[test]
#[serial]
fn load_active_reads_file_from_env() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("vipthread.toml");
    fs::write(&path, FULL).unwrap();
    let prev = env::var(CONFIG_ENV).ok();
    env::set_var(CONFIG_ENV, &path);

    let cfg = VipConfig::load_active();
    assert!(cfg.enabled);
    assert!(cfg.trace);
    assert_eq!(cfg.reservation_mode, ReservationMode::KeepLast);
    assert_eq!(cfg.default_reserved, 2);
    assert_eq!(cfg.token_match, TokenMatch::Prefix);
    assert!(cfg.preload_canned);
    assert_eq!(cfg.app_reservation.map(|a| a.min_threads), Some(4));
    assert_eq!(
        cfg.fallback_pair.as_ref().map(|p| p.server.as_str()),
        Some("surfaceflinger")
    );
    assert_eq!(cfg.overrides.get("system_server"), Some(&3));

    restore(prev);
}

#[test]
#[serial]
fn load_active_falls_back_to_defaults() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let prev = env::var(CONFIG_ENV).ok();

    env::set_var(CONFIG_ENV, dir.path().join("missing.toml"));
    assert_eq!(VipConfig::load_active(), VipConfig::default());

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "enabled = \"maybe\"").unwrap();
    env::set_var(CONFIG_ENV, &broken);
    assert_eq!(VipConfig::load_active(), VipConfig::default());

    env::remove_var(CONFIG_ENV);
    assert_eq!(VipConfig::load_active(), VipConfig::default());

    restore(prev);
}

#[test]
fn load_reports_errors() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        VipConfig::load(&dir.path().join("nope.toml")),
        Err(ConfigError::Io { .. })
    ));
    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "reservation_mode = \"sideways\"").unwrap();
    assert!(matches!(VipConfig::load(&bad), Err(ConfigError::Parse(_))));
}
