// CLASSIFICATION: COMMUNITY
// Filename: vip.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! The VIP thread policy as a set of host pool hooks.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::config::VipConfig;
use crate::dispatcher::ThreadDispatcher;
use crate::error::VipResult;
use crate::policy::{Generation, PolicyGroup, PolicyMatcher, PolicyRule, PolicyStore};
use crate::pool::{
    CallFlags, Dispatch, IncomingCall, PoolHooks, ProcessContext, Selection, ThreadId,
    WaitPosition, WorkItem,
};
use crate::reservation::ReservationTracker;
use crate::selector::WorkQueueSelector;

/// Global switches consulted at every policy entry point.
#[derive(Debug)]
pub struct PolicyGate {
    enabled: AtomicBool,
    trace: AtomicBool,
}

impl PolicyGate {
    pub fn new(enabled: bool, trace: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            trace: AtomicBool::new(trace),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn trace(&self) -> bool {
        self.trace.load(Ordering::Relaxed)
    }

    pub fn set_trace(&self, trace: bool) {
        self.trace.store(trace, Ordering::Relaxed);
    }
}

/// Rule store, classifier, reservation tracker and dispatch rules bound
/// together behind one gate.
#[derive(Debug)]
pub struct VipPolicy {
    gate: PolicyGate,
    store: PolicyStore,
    matcher: PolicyMatcher,
    tracker: ReservationTracker,
    selector: WorkQueueSelector,
    dispatcher: ThreadDispatcher,
}

impl VipPolicy {
    pub fn new(config: &VipConfig) -> VipResult<Self> {
        let policy = Self {
            gate: PolicyGate::new(config.enabled, config.trace),
            store: PolicyStore::new(),
            matcher: PolicyMatcher::new(config.token_match, config.fallback_pair.as_ref()),
            tracker: ReservationTracker::new(config),
            selector: WorkQueueSelector,
            dispatcher: ThreadDispatcher,
        };
        if config.preload_canned {
            policy.load_canned()?;
        }
        info!(
            "VIP policy ready (enabled: {}, mode: {:?})",
            config.enabled,
            policy.tracker.mode()
        );
        Ok(policy)
    }

    /// Fill both generations with the canned rule sets, `Default` active.
    fn load_canned(&self) -> VipResult<()> {
        for generation in [Generation::AppSwitch, Generation::Default] {
            let mut rebuild = self.store.begin_rebuild(generation)?;
            for (index, spec) in PolicyGroup::canned(generation).iter().enumerate() {
                rebuild.add_rule(PolicyRule::from_spec(spec, index)?)?;
            }
            rebuild.commit()?;
        }
        Ok(())
    }

    pub fn gate(&self) -> &PolicyGate {
        &self.gate
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn tracker(&self) -> &ReservationTracker {
        &self.tracker
    }

    pub fn matcher(&self) -> &PolicyMatcher {
        &self.matcher
    }

    /// Final flags of a call. With the gate off no rule is consulted and
    /// VIP and URGENT are stripped.
    pub fn classify_call(&self, call: &IncomingCall) -> VipResult<CallFlags> {
        if !self.gate.is_enabled() {
            return Ok(call.flags - CallFlags::PRIORITY);
        }
        let group = self.store.read()?;
        let flags = self.matcher.classify(call, &group);
        if self.gate.trace() {
            debug!(
                "classify {} code {} {} -> {} in {:?}: {:?} -> {:?}",
                call.token,
                call.code,
                call.from.name,
                call.to.name,
                group.generation(),
                call.flags,
                flags
            );
        }
        Ok(flags)
    }
}

impl PoolHooks for VipPolicy {
    fn classify(&self, call: &IncomingCall) -> CallFlags {
        match self.classify_call(call) {
            Ok(flags) => flags,
            Err(e) => {
                warn!("classification failed, priority dropped: {e}");
                call.flags - CallFlags::PRIORITY
            }
        }
    }

    fn on_pool_resize(&self, ctx: &mut ProcessContext) {
        if !self.gate.is_enabled() {
            return;
        }
        let result = self
            .store
            .read()
            .and_then(|group| self.tracker.on_pool_resize(ctx, &group));
        if let Err(e) = result {
            warn!("reservation for {} not updated: {e}", ctx.name());
        }
    }

    fn on_thread_registered(&self, ctx: &mut ProcessContext, thread: ThreadId) {
        if self.gate.is_enabled() {
            self.tracker.on_thread_registered(ctx, thread);
        }
    }

    fn on_thread_exited(&self, ctx: &mut ProcessContext, thread: ThreadId) {
        self.tracker.on_thread_exited(ctx, thread);
    }

    fn pick_thread(&self, item: &WorkItem, ctx: &mut ProcessContext) -> Dispatch {
        if !self.gate.is_enabled() {
            return Dispatch::Baseline;
        }
        let picked = self.dispatcher.pick_thread(item, ctx);
        if self.gate.trace() {
            debug!("dispatch {:?} (vip: {}) -> {picked:?}", item.id(), item.is_vip());
        }
        match picked {
            Some(thread) => Dispatch::Thread(thread),
            None => Dispatch::Hold,
        }
    }

    fn select_next(&self, thread: ThreadId, ctx: &mut ProcessContext) -> Selection {
        if !self.gate.is_enabled() {
            return Selection::Baseline;
        }
        self.selector.select_next(thread, ctx)
    }

    fn has_work(&self, thread: ThreadId, ctx: &ProcessContext) -> bool {
        if !self.gate.is_enabled() {
            return ctx.baseline_has_work(thread);
        }
        self.selector.has_work(thread, ctx)
    }

    fn wait_position(&self, thread: ThreadId, ctx: &ProcessContext) -> Option<WaitPosition> {
        if !self.gate.is_enabled() {
            return None;
        }
        self.dispatcher.wait_position(thread, ctx)
    }

    fn wants_spawn(&self, ctx: &ProcessContext) -> bool {
        self.gate.is_enabled() && self.tracker.wants_reserved_spawn(ctx)
    }
}
