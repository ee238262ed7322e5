// CLASSIFICATION: COMMUNITY
// Filename: reservation.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Decides how many threads a process reserves for VIP work and which
//! threads those are.

use std::collections::HashMap;
use std::sync::RwLock;

use log::{debug, info};

use crate::config::{AppReservation, ReservationMode, VipConfig};
use crate::error::{VipError, VipResult};
use crate::policy::PolicyGroup;
use crate::pool::{ProcName, ProcRef, ProcessContext, ThreadId};

/// Per-process reservation bookkeeping.
#[derive(Debug)]
pub struct ReservationTracker {
    mode: ReservationMode,
    default_reserved: usize,
    app: Option<AppReservation>,
    overrides: RwLock<HashMap<ProcName, usize>>,
}

impl ReservationTracker {
    pub fn new(config: &VipConfig) -> Self {
        let overrides = config
            .overrides
            .iter()
            .map(|(name, count)| (ProcName::new(name), *count))
            .collect();
        Self {
            mode: config.reservation_mode,
            default_reserved: config.default_reserved,
            app: config.app_reservation,
            overrides: RwLock::new(overrides),
        }
    }

    pub fn mode(&self) -> ReservationMode {
        self.mode
    }

    // === Overrides ===

    pub fn set_override(&self, name: &str, count: usize) -> VipResult<()> {
        let name = ProcName::new(name);
        info!("reservation override for {name}: {count}");
        self.overrides
            .write()
            .map_err(|_| VipError::LockPoisoned("reservation overrides"))?
            .insert(name, count);
        Ok(())
    }

    pub fn clear_override(&self, name: &str) -> VipResult<Option<usize>> {
        let name = ProcName::new(name);
        let previous = self
            .overrides
            .write()
            .map_err(|_| VipError::LockPoisoned("reservation overrides"))?
            .remove(&name);
        if previous.is_some() {
            info!("reservation override for {name} cleared");
        }
        Ok(previous)
    }

    pub fn override_for(&self, name: &ProcName) -> VipResult<Option<usize>> {
        Ok(self
            .overrides
            .read()
            .map_err(|_| VipError::LockPoisoned("reservation overrides"))?
            .get(name)
            .copied())
    }

    /// Reserved thread count a process should get. Processes no rule or
    /// override knows about get none.
    pub fn reservation_for(
        &self,
        proc: &ProcRef,
        baseline: usize,
        group: &PolicyGroup,
    ) -> VipResult<usize> {
        if let Some(count) = self.override_for(&proc.name)? {
            return Ok(count);
        }
        if group.serves(&proc.name) {
            return Ok(self.default_reserved);
        }
        let app = self
            .app
            .map_or(false, |app| app.applies(proc.uid, baseline));
        Ok(if app { self.default_reserved } else { 0 })
    }

    // === Lifecycle ===

    /// The process set its thread baseline; recompute its reservation.
    pub fn on_pool_resize(&self, ctx: &mut ProcessContext, group: &PolicyGroup) -> VipResult<usize> {
        let count = self.reservation_for(ctx.proc(), ctx.baseline_threads(), group)?;
        ctx.set_reserved_count(count);
        if count > 0 {
            info!(
                "process {} reserves {count} of {} threads ({:?})",
                ctx.name(),
                ctx.baseline_threads(),
                self.mode
            );
        }
        Ok(count)
    }

    /// Tag a freshly registered thread. `started_threads` still excludes it.
    pub fn on_thread_registered(&self, ctx: &mut ProcessContext, thread: ThreadId) -> bool {
        let index = ctx.started_threads();
        let baseline = ctx.baseline_threads();
        let reserved = ctx.reserved_count();
        let tagged = reserved > 0
            && match self.mode {
                ReservationMode::Window => index >= baseline && index - baseline < reserved,
                ReservationMode::KeepLast => {
                    let keep = reserved.min(baseline.saturating_sub(1));
                    keep > 0 && index >= baseline - keep && index < baseline
                }
            };
        if tagged {
            if let Some(worker) = ctx.thread_mut(thread) {
                worker.mark_reserved();
                debug!("{thread} of {} reserved for VIP work", ctx.name());
            }
        }
        tagged
    }

    pub fn on_thread_exited(&self, ctx: &mut ProcessContext, thread: ThreadId) {
        if let Some(worker) = ctx.thread_mut(thread) {
            if worker.is_reserved() {
                worker.clear_reserved();
                debug!("reserved {thread} of {} exited", ctx.name());
            }
        }
    }

    /// Whether the host should spawn a reserved thread for queued VIP work
    /// nobody can take.
    pub fn wants_reserved_spawn(&self, ctx: &ProcessContext) -> bool {
        let baseline = ctx.baseline_threads();
        let started = ctx.started_threads();
        self.mode == ReservationMode::Window
            && ctx.reserved_count() > 0
            && ctx.requested_threads() == 0
            && ctx.waiting().is_empty()
            && started >= baseline
            && started - baseline < ctx.reserved_count()
            && ctx.has_vip_work()
    }
}
