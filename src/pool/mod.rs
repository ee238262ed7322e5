// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Reference host worker pool.
//!
//! Owns per-process contexts, applies the baseline selection and dispatch
//! rules, and defers to an injected [`PoolHooks`] at each lifecycle step.

pub mod context;
pub mod hooks;
pub mod thread;
pub mod work;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, info};
use thiserror::Error;

pub use context::ProcessContext;
pub use hooks::{BaselineHooks, Dispatch, PoolHooks, Selection, WaitPosition};
pub use thread::{LooperState, ThreadId, WorkerThread};
pub use work::{
    token_from_parcel, CallFlags, IncomingCall, ProcName, ProcRef, WorkId, WorkItem,
};

/// Errors returned by [`HostPool`] operations.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("process {0} is not attached")]
    UnknownProcess(u32),
    #[error("process {0} is already attached")]
    AlreadyAttached(u32),
    #[error("thread {thread} not found in process {pid}")]
    UnknownThread { pid: u32, thread: ThreadId },
    #[error("thread {thread} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        thread: ThreadId,
        from: LooperState,
        to: LooperState,
    },
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Result of handing a call to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub work: WorkId,
    pub flags: CallFlags,
    /// Thread that received the item on its private queue.
    pub woken: Option<ThreadId>,
    pub spawn_requested: bool,
}

type ContextSlot = Arc<Mutex<ProcessContext>>;

/// Worker pool serving any number of processes.
pub struct HostPool {
    hooks: Arc<dyn PoolHooks>,
    fairness: WaitPosition,
    processes: RwLock<HashMap<u32, ContextSlot>>,
    next_work: AtomicU64,
}

impl HostPool {
    pub fn new(hooks: Arc<dyn PoolHooks>) -> Self {
        Self {
            hooks,
            fairness: WaitPosition::default(),
            processes: RwLock::new(HashMap::new()),
            next_work: AtomicU64::new(1),
        }
    }

    /// Set where idle threads rejoin the waiting list by default.
    pub fn with_fairness(mut self, fairness: WaitPosition) -> Self {
        self.fairness = fairness;
        self
    }

    // === Processes ===

    pub fn attach(&self, proc: ProcRef) -> PoolResult<()> {
        let mut table = self
            .processes
            .write()
            .map_err(|_| PoolError::LockPoisoned("process table"))?;
        if table.contains_key(&proc.pid) {
            return Err(PoolError::AlreadyAttached(proc.pid));
        }
        info!("attached process {} ({})", proc.pid, proc.name);
        table.insert(proc.pid, Arc::new(Mutex::new(ProcessContext::new(proc))));
        Ok(())
    }

    /// Drop a process and everything queued for it. Returns the number of
    /// items discarded.
    pub fn detach(&self, pid: u32) -> PoolResult<usize> {
        let slot = self
            .processes
            .write()
            .map_err(|_| PoolError::LockPoisoned("process table"))?
            .remove(&pid)
            .ok_or(PoolError::UnknownProcess(pid))?;
        let dropped = slot
            .lock()
            .map_err(|_| PoolError::LockPoisoned("process context"))?
            .pending_items();
        info!("detached process {pid}, {dropped} queued items dropped");
        Ok(dropped)
    }

    /// The process asked for `max_threads` pool threads.
    pub fn set_max_threads(&self, pid: u32, max_threads: usize) -> PoolResult<()> {
        self.with_context(pid, |ctx| {
            ctx.set_baseline_threads(max_threads);
            self.hooks.on_pool_resize(ctx);
            debug!(
                "process {pid} baseline {max_threads}, reserved {}",
                ctx.reserved_count()
            );
            Ok(())
        })
    }

    /// Reserved thread count of a process; unknown processes have none.
    pub fn reserved_count(&self, pid: u32) -> usize {
        match self.inspect(pid, ProcessContext::reserved_count) {
            Ok(count) => count,
            Err(e) => {
                debug!("no reservation state: {e}");
                0
            }
        }
    }

    /// Read-only view of a process context.
    pub fn inspect<R>(&self, pid: u32, f: impl FnOnce(&ProcessContext) -> R) -> PoolResult<R> {
        self.with_context(pid, |ctx| Ok(f(ctx)))
    }

    // === Threads ===

    /// Register a pool-spawned thread.
    pub fn spawn_thread(&self, pid: u32) -> PoolResult<ThreadId> {
        self.with_context(pid, |ctx| {
            let id = ctx.add_thread();
            self.hooks.on_thread_registered(ctx, id);
            ctx.note_thread_started();
            debug!(
                "process {pid} registered {id} (reserved: {})",
                ctx.is_reserved(id)
            );
            Ok(id)
        })
    }

    pub fn enter(&self, pid: u32, thread: ThreadId) -> PoolResult<()> {
        self.with_context(pid, |ctx| transition(ctx, thread, LooperState::Entered))
    }

    /// Park a thread on the waiting list. Returns `false`, leaving the
    /// thread unparked, when it still has work it may take; the caller
    /// polls again instead of sleeping.
    pub fn wait(&self, pid: u32, thread: ThreadId) -> PoolResult<bool> {
        self.with_context(pid, |ctx| {
            check_transition(ctx, thread, LooperState::Waiting)?;
            if self.hooks.has_work(thread, ctx) {
                debug!("{thread} of process {pid} has work, not parked");
                return Ok(false);
            }
            transition(ctx, thread, LooperState::Waiting)?;
            let position = self
                .hooks
                .wait_position(thread, ctx)
                .unwrap_or(self.fairness);
            let waiting = ctx.waiting_mut();
            waiting.retain(|t| *t != thread);
            match position {
                WaitPosition::Head => waiting.push_front(thread),
                WaitPosition::Tail => waiting.push_back(thread),
            }
            Ok(true)
        })
    }

    /// Ask a thread to return to its caller. It is not parked again until
    /// it polls.
    pub fn request_return(&self, pid: u32, thread: ThreadId) -> PoolResult<()> {
        self.with_context(pid, |ctx| {
            ctx.thread_mut(thread)
                .ok_or(PoolError::UnknownThread { pid, thread })?
                .set_need_return(true);
            Ok(())
        })
    }

    /// Take the next item this thread should run, if any.
    pub fn poll(&self, pid: u32, thread: ThreadId) -> PoolResult<Option<WorkItem>> {
        self.with_context(pid, |ctx| {
            transition(ctx, thread, LooperState::Polling)?;
            ctx.waiting_mut().retain(|t| *t != thread);
            if let Some(worker) = ctx.thread_mut(thread) {
                worker.set_need_return(false);
            }
            let next = match self.hooks.select_next(thread, ctx) {
                Selection::Baseline => baseline_select(ctx, thread),
                Selection::Item(item) => Some(item),
                Selection::Idle => None,
            };
            if let Some(item) = &next {
                debug!("{thread} of process {pid} took work {:?}", item.id());
            }
            Ok(next)
        })
    }

    /// Retire a thread. Work left on its private queue goes back to the
    /// front of the process queue.
    pub fn exit(&self, pid: u32, thread: ThreadId) -> PoolResult<()> {
        self.with_context(pid, |ctx| {
            transition(ctx, thread, LooperState::Exited)?;
            self.hooks.on_thread_exited(ctx, thread);
            ctx.waiting_mut().retain(|t| *t != thread);
            let leftover = ctx
                .thread_mut(thread)
                .map(WorkerThread::drain_private)
                .unwrap_or_default();
            for item in leftover.into_iter().rev() {
                ctx.queue_mut().push_front(item);
            }
            debug!("{thread} of process {pid} exited");
            Ok(())
        })
    }

    // === Work ===

    /// Classify a call, queue it and wake a worker if one is eligible.
    pub fn submit(&self, call: IncomingCall) -> PoolResult<Submitted> {
        let pid = call.to.pid;
        let slot = self.slot(pid)?;
        let flags = self.hooks.classify(&call);
        let work = WorkId(self.next_work.fetch_add(1, Ordering::Relaxed));
        let item = WorkItem::new(work, call, flags);

        let mut ctx = slot
            .lock()
            .map_err(|_| PoolError::LockPoisoned("process context"))?;
        let woken = match self.hooks.pick_thread(&item, &mut ctx) {
            Dispatch::Baseline => ctx.waiting_mut().pop_front(),
            Dispatch::Thread(thread) => Some(thread),
            Dispatch::Hold => None,
        };
        let worker = match woken {
            Some(thread) => ctx.thread_mut(thread),
            None => None,
        };
        let woken = match worker {
            Some(worker) => {
                worker.push_private(item);
                worker.set_state(LooperState::Polling);
                Some(worker.id())
            }
            None => {
                ctx.queue_mut().push_back(item);
                None
            }
        };
        let spawn_requested = self.hooks.wants_spawn(&ctx);
        if spawn_requested {
            ctx.request_spawn();
        }
        debug!("work {work:?} for process {pid} flags {flags:?} woke {woken:?}");
        Ok(Submitted {
            work,
            flags,
            woken,
            spawn_requested,
        })
    }

    fn slot(&self, pid: u32) -> PoolResult<ContextSlot> {
        self.processes
            .read()
            .map_err(|_| PoolError::LockPoisoned("process table"))?
            .get(&pid)
            .cloned()
            .ok_or(PoolError::UnknownProcess(pid))
    }

    fn with_context<R>(
        &self,
        pid: u32,
        f: impl FnOnce(&mut ProcessContext) -> PoolResult<R>,
    ) -> PoolResult<R> {
        let slot = self.slot(pid)?;
        let mut ctx = slot
            .lock()
            .map_err(|_| PoolError::LockPoisoned("process context"))?;
        f(&mut ctx)
    }
}

fn check_transition(ctx: &ProcessContext, thread: ThreadId, next: LooperState) -> PoolResult<()> {
    let pid = ctx.proc().pid;
    let from = ctx
        .thread(thread)
        .ok_or(PoolError::UnknownThread { pid, thread })?
        .state();
    if !from.can_move_to(next) {
        return Err(PoolError::InvalidTransition {
            thread,
            from,
            to: next,
        });
    }
    Ok(())
}

fn transition(ctx: &mut ProcessContext, thread: ThreadId, next: LooperState) -> PoolResult<()> {
    check_transition(ctx, thread, next)?;
    if let Some(worker) = ctx.thread_mut(thread) {
        worker.set_state(next);
    }
    Ok(())
}

/// Unmodified pool rule: private queue first, then the process queue.
fn baseline_select(ctx: &mut ProcessContext, thread: ThreadId) -> Option<WorkItem> {
    ctx.thread_mut(thread)
        .and_then(WorkerThread::pop_private)
        .or_else(|| ctx.queue_mut().pop_front())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(pid: u32, code: u32) -> IncomingCall {
        IncomingCall::new(
            "android.os.IServiceManager",
            code,
            ProcRef::new(900, 10100, "client"),
            ProcRef::new(pid, 1000, "server"),
        )
    }

    #[test]
    fn baseline_pool_serves_fifo() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        pool.attach(ProcRef::new(10, 1000, "server")).unwrap();
        let t = pool.spawn_thread(10).unwrap();
        pool.enter(10, t).unwrap();

        pool.submit(call(10, 1)).unwrap();
        pool.submit(call(10, 2)).unwrap();
        assert_eq!(pool.poll(10, t).unwrap().map(|w| w.code()), Some(1));
        assert_eq!(pool.poll(10, t).unwrap().map(|w| w.code()), Some(2));
        assert!(pool.poll(10, t).unwrap().is_none());
    }

    #[test]
    fn waiting_thread_is_woken_with_private_work() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        pool.attach(ProcRef::new(10, 1000, "server")).unwrap();
        let t = pool.spawn_thread(10).unwrap();
        pool.enter(10, t).unwrap();
        pool.wait(10, t).unwrap();

        let sent = pool.submit(call(10, 7)).unwrap();
        assert_eq!(sent.woken, Some(t));
        assert!(pool.inspect(10, |ctx| ctx.waiting().is_empty()).unwrap());
        assert_eq!(pool.poll(10, t).unwrap().map(|w| w.code()), Some(7));
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        pool.attach(ProcRef::new(10, 1000, "server")).unwrap();
        let t = pool.spawn_thread(10).unwrap();
        assert!(matches!(
            pool.wait(10, t),
            Err(PoolError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn unknown_process_has_no_reservation() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        assert_eq!(pool.reserved_count(42), 0);
        assert!(matches!(
            pool.submit(call(42, 1)),
            Err(PoolError::UnknownProcess(42))
        ));
    }

    #[test]
    fn thread_with_queued_work_is_not_parked() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        pool.attach(ProcRef::new(10, 1000, "server")).unwrap();
        let t = pool.spawn_thread(10).unwrap();
        pool.enter(10, t).unwrap();
        pool.submit(call(10, 4)).unwrap();

        assert!(!pool.wait(10, t).unwrap());
        assert!(pool.inspect(10, |ctx| ctx.waiting().is_empty()).unwrap());
        assert_eq!(pool.poll(10, t).unwrap().map(|w| w.code()), Some(4));
        assert!(pool.wait(10, t).unwrap());
    }

    #[test]
    fn requested_return_skips_parking_until_polled() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        pool.attach(ProcRef::new(10, 1000, "server")).unwrap();
        let t = pool.spawn_thread(10).unwrap();
        pool.enter(10, t).unwrap();
        pool.request_return(10, t).unwrap();

        assert!(!pool.wait(10, t).unwrap());
        assert!(pool.poll(10, t).unwrap().is_none());
        assert!(pool.wait(10, t).unwrap());
        assert!(matches!(
            pool.request_return(10, ThreadId(99)),
            Err(PoolError::UnknownThread { .. })
        ));
    }

    #[test]
    fn exit_requeues_private_work() {
        let pool = HostPool::new(Arc::new(BaselineHooks));
        pool.attach(ProcRef::new(10, 1000, "server")).unwrap();
        let t = pool.spawn_thread(10).unwrap();
        pool.enter(10, t).unwrap();
        pool.wait(10, t).unwrap();
        pool.submit(call(10, 3)).unwrap();
        pool.exit(10, t).unwrap();

        let codes = pool
            .inspect(10, |ctx| ctx.queue().iter().map(|w| w.code()).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(codes, vec![3]);
    }
}
