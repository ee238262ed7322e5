// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Policy configuration, loaded from TOML.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "VIPTHREAD_CONFIG";

/// How a rule's interface token is compared with a call's token hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMatch {
    #[default]
    Exact,
    /// The rule token starts with the (possibly truncated) hint.
    Prefix,
}

impl TokenMatch {
    pub fn matches(self, rule_token: &str, hint: &str) -> bool {
        match self {
            TokenMatch::Exact => rule_token == hint,
            TokenMatch::Prefix => !hint.is_empty() && rule_token.starts_with(hint),
        }
    }
}

/// Which pool threads become reserved at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationMode {
    /// Threads spawned just past the baseline.
    #[default]
    Window,
    /// The trailing threads of the baseline itself.
    KeepLast,
}

/// Client/server pair forced to VIP when no rule matched. Test use only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FallbackPair {
    pub client: String,
    pub server: String,
}

/// Reserve threads for application processes without a server rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AppReservation {
    pub min_uid: u32,
    pub max_uid: u32,
    /// Baseline must exceed this for the reservation to apply.
    pub min_threads: usize,
}

impl Default for AppReservation {
    fn default() -> Self {
        Self {
            min_uid: 10000,
            max_uid: 19999,
            min_threads: 4,
        }
    }
}

impl AppReservation {
    pub fn applies(&self, uid: u32, baseline: usize) -> bool {
        uid > self.min_uid && uid < self.max_uid && baseline > self.min_threads
    }
}

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration of the VIP policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VipConfig {
    /// Global gate; off means the pool behaves as if the policy were absent.
    pub enabled: bool,
    /// Log every classification and dispatch decision.
    pub trace: bool,
    pub reservation_mode: ReservationMode,
    /// Threads reserved for a process named by a server rule.
    pub default_reserved: usize,
    pub token_match: TokenMatch,
    /// Load the canned rule sets into both generations at start-up.
    pub preload_canned: bool,
    pub app_reservation: Option<AppReservation>,
    pub fallback_pair: Option<FallbackPair>,
    /// Per-process reserved thread counts, keyed by process name.
    pub overrides: BTreeMap<String, usize>,
}

impl Default for VipConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trace: false,
            reservation_mode: ReservationMode::Window,
            default_reserved: 1,
            token_match: TokenMatch::Exact,
            preload_canned: false,
            app_reservation: None,
            fallback_pair: None,
            overrides: BTreeMap::new(),
        }
    }
}

impl VipConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        info!("loaded policy config from {}", path.display());
        Ok(cfg)
    }

    /// Load from `VIPTHREAD_CONFIG`, falling back to defaults.
    pub fn load_active() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("using default policy config: {e}");
                Self::default()
            }
        }
    }
}
