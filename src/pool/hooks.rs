// CLASSIFICATION: COMMUNITY
// Filename: hooks.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Extension points the host pool calls at each lifecycle step.
//!
//! Every method defaults to the unmodified pool behaviour, so an empty
//! implementation ([`BaselineHooks`]) is the plain host pool.

use super::context::ProcessContext;
use super::thread::ThreadId;
use super::work::{CallFlags, IncomingCall, WorkItem};

/// Outcome of asking a hook which waiting thread should take an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Use the host's own choice.
    Baseline,
    /// Wake this thread; it has already left the waiting list.
    Thread(ThreadId),
    /// Wake nobody, leave the item on the process queue.
    Hold,
}

/// Outcome of asking a hook what a polling thread should run next.
#[derive(Debug)]
pub enum Selection {
    Baseline,
    Item(WorkItem),
    /// Nothing this thread may take, even if other work is queued.
    Idle,
}

/// Where a thread re-enters the waiting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPosition {
    #[default]
    Head,
    Tail,
}

/// Hooks injected into [`super::HostPool`].
pub trait PoolHooks: Send + Sync {
    /// Decide the final flags of a call. Called without any process lock.
    fn classify(&self, call: &IncomingCall) -> CallFlags {
        call.flags
    }

    /// The process changed its requested thread count.
    fn on_pool_resize(&self, _ctx: &mut ProcessContext) {}

    /// A pool-spawned thread registered. Runs before the host counts it.
    fn on_thread_registered(&self, _ctx: &mut ProcessContext, _thread: ThreadId) {}

    fn on_thread_exited(&self, _ctx: &mut ProcessContext, _thread: ThreadId) {}

    fn pick_thread(&self, _item: &WorkItem, _ctx: &mut ProcessContext) -> Dispatch {
        Dispatch::Baseline
    }

    fn select_next(&self, _thread: ThreadId, _ctx: &mut ProcessContext) -> Selection {
        Selection::Baseline
    }

    /// Whether `thread` has work it may run. A thread with work is not
    /// parked.
    fn has_work(&self, thread: ThreadId, ctx: &ProcessContext) -> bool {
        ctx.baseline_has_work(thread)
    }

    /// `None` keeps the host's fairness policy.
    fn wait_position(&self, _thread: ThreadId, _ctx: &ProcessContext) -> Option<WaitPosition> {
        None
    }

    /// Whether the host should spawn another thread after queuing work.
    fn wants_spawn(&self, _ctx: &ProcessContext) -> bool {
        false
    }
}

/// The host pool with no policy attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineHooks;

impl PoolHooks for BaselineHooks {}
