// CLASSIFICATION: COMMUNITY
// Filename: context.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Per-process pool state: queues, waiting list and thread table.

use std::collections::{BTreeMap, VecDeque};

use super::thread::{ThreadId, WorkerThread};
use super::work::{ProcName, ProcRef, WorkItem};

/// Pool state for one serving process.
///
/// Guarded by the host pool's per-process lock; every method assumes the
/// caller holds it.
#[derive(Debug)]
pub struct ProcessContext {
    proc: ProcRef,
    baseline_threads: usize,
    started_threads: usize,
    requested_threads: usize,
    reserved_count: usize,
    queue: VecDeque<WorkItem>,
    waiting: VecDeque<ThreadId>,
    threads: BTreeMap<ThreadId, WorkerThread>,
    next_thread: u32,
}

impl ProcessContext {
    pub fn new(proc: ProcRef) -> Self {
        Self {
            proc,
            baseline_threads: 0,
            started_threads: 0,
            requested_threads: 0,
            reserved_count: 0,
            queue: VecDeque::new(),
            waiting: VecDeque::new(),
            threads: BTreeMap::new(),
            next_thread: 1,
        }
    }

    pub fn proc(&self) -> &ProcRef {
        &self.proc
    }

    pub fn name(&self) -> &ProcName {
        &self.proc.name
    }

    // === Thread accounting ===

    /// Thread count requested by the process (`max_threads`).
    pub fn baseline_threads(&self) -> usize {
        self.baseline_threads
    }

    pub fn set_baseline_threads(&mut self, baseline: usize) {
        self.baseline_threads = baseline;
    }

    /// Pool-spawned threads registered so far.
    pub fn started_threads(&self) -> usize {
        self.started_threads
    }

    pub fn note_thread_started(&mut self) {
        self.started_threads += 1;
        self.requested_threads = self.requested_threads.saturating_sub(1);
    }

    /// Spawn requests issued but not yet registered.
    pub fn requested_threads(&self) -> usize {
        self.requested_threads
    }

    pub fn request_spawn(&mut self) {
        self.requested_threads += 1;
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved_count
    }

    pub fn set_reserved_count(&mut self, count: usize) {
        self.reserved_count = count;
    }

    // === Threads ===

    pub fn add_thread(&mut self) -> ThreadId {
        let id = ThreadId(self.next_thread);
        self.next_thread += 1;
        self.threads.insert(id, WorkerThread::new(id));
        id
    }

    pub fn thread(&self, id: ThreadId) -> Option<&WorkerThread> {
        self.threads.get(&id)
    }

    pub fn thread_mut(&mut self, id: ThreadId) -> Option<&mut WorkerThread> {
        self.threads.get_mut(&id)
    }

    pub fn threads(&self) -> impl Iterator<Item = &WorkerThread> {
        self.threads.values()
    }

    pub fn is_reserved(&self, id: ThreadId) -> bool {
        self.threads.get(&id).map_or(false, WorkerThread::is_reserved)
    }

    pub fn reserved_threads(&self) -> usize {
        self.threads.values().filter(|t| t.is_reserved()).count()
    }

    // === Queues ===

    /// Process-wide work queue.
    pub fn queue(&self) -> &VecDeque<WorkItem> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut VecDeque<WorkItem> {
        &mut self.queue
    }

    /// Threads parked for work, head first.
    pub fn waiting(&self) -> &VecDeque<ThreadId> {
        &self.waiting
    }

    pub fn waiting_mut(&mut self) -> &mut VecDeque<ThreadId> {
        &mut self.waiting
    }

    /// Host rule: private work, a pending return, or anything queued.
    pub fn baseline_has_work(&self, id: ThreadId) -> bool {
        let own = self
            .threads
            .get(&id)
            .map_or(false, |t| !t.private_queue().is_empty() || t.need_return());
        own || !self.queue.is_empty()
    }

    pub fn has_vip_work(&self) -> bool {
        self.queue.iter().any(WorkItem::is_vip)
    }

    /// Queued items across the process queue and every private queue.
    pub fn pending_items(&self) -> usize {
        self.queue.len()
            + self
                .threads
                .values()
                .map(|t| t.private_queue().len())
                .sum::<usize>()
    }
}
