// CLASSIFICATION: COMMUNITY
// Filename: vipctl.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use vipthread::pool::{CallFlags, IncomingCall, ProcRef};
use vipthread::{LoadMode, PolicyControl, VipConfig, VipError, VipPolicy};

#[derive(Parser)]
#[command(about = "VIP thread policy rule tool")]
struct Cli {
    /// Policy config (TOML); defaults to $VIPTHREAD_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a JSON rule file
    Check {
        rules: PathBuf,
        /// Accept the file if at least one rule is valid
        #[arg(long)]
        best_effort: bool,
    },
    /// Print a rule file in line form
    Show { rules: PathBuf },
    /// Classify a synthetic call against a rule file
    Classify {
        rules: PathBuf,
        #[arg(long)]
        token: String,
        #[arg(long, default_value_t = 1)]
        code: u32,
        #[arg(long, default_value = "")]
        client: String,
        #[arg(long, default_value = "")]
        server: String,
        /// Caller already asked for VIP handling
        #[arg(long)]
        vip: bool,
        /// Caller already asked for urgent handling
        #[arg(long)]
        urgent: bool,
    },
}

fn control(config: Option<&Path>, rules: &Path, mode: LoadMode) -> Result<PolicyControl> {
    let mut cfg = match config {
        Some(path) => VipConfig::load(path)?,
        None => VipConfig::load_active(),
    };
    cfg.enabled = true;
    cfg.preload_canned = false;
    let control = PolicyControl::new(Arc::new(VipPolicy::new(&cfg)?));
    let json = fs::read_to_string(rules)
        .with_context(|| format!("reading {}", rules.display()))?;
    let report = control.submit_json(&json, mode)?;
    for rejected in &report.rejected {
        eprintln!("rule {}: {}", rejected.position, rejected.reason);
    }
    Ok(control)
}

fn check(config: Option<&Path>, rules: &Path, best_effort: bool) -> Result<()> {
    let mode = if best_effort {
        LoadMode::BestEffort
    } else {
        LoadMode::Atomic
    };
    match control(config, rules, mode) {
        Ok(control) => {
            println!("{} rules ok", control.rule_lines()?.len());
            Ok(())
        }
        Err(e) => {
            if let Some(VipError::InvalidRules(rejected)) = e.downcast_ref::<VipError>() {
                for r in rejected {
                    eprintln!("rule {}: {}", r.position, r.reason);
                }
            }
            bail!("{}: {e}", rules.display())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.cmd {
        Command::Check { rules, best_effort } => check(config, &rules, best_effort)?,
        Command::Show { rules } => {
            let control = control(config, &rules, LoadMode::BestEffort)?;
            let lines = control.rule_lines()?;
            for line in &lines {
                println!("{line}");
            }
            log::info!("{} rules listed from {}", lines.len(), rules.display());
        }
        Command::Classify {
            rules,
            token,
            code,
            client,
            server,
            vip,
            urgent,
        } => {
            let control = control(config, &rules, LoadMode::BestEffort)?;
            let mut flags = CallFlags::empty();
            flags.set(CallFlags::VIP, vip);
            flags.set(CallFlags::URGENT, urgent);
            let call = IncomingCall::new(
                token,
                code,
                ProcRef::new(0, 0, client.as_str()),
                ProcRef::new(0, 0, server.as_str()),
            )
            .with_flags(flags);
            let out = control.policy().classify_call(&call)?;
            println!(
                "vip={} urgent={} flags={:#06x}",
                out.contains(CallFlags::VIP),
                out.contains(CallFlags::URGENT),
                out.bits()
            );
        }
    }
    Ok(())
}
