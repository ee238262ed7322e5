// CLASSIFICATION: COMMUNITY
// Filename: thread.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::collections::VecDeque;
use std::fmt;

use super::work::WorkItem;

/// Pool-local worker identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u32);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Looper state of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperState {
    Registered,
    Entered,
    Waiting,
    Polling,
    Exited,
}

impl LooperState {
    /// Whether the state machine allows moving to `next`.
    pub fn can_move_to(self, next: LooperState) -> bool {
        use LooperState::*;
        matches!(
            (self, next),
            (Registered, Entered)
                | (Entered, Waiting)
                | (Entered, Polling)
                | (Waiting, Polling)
                | (Polling, Waiting)
                | (Polling, Polling)
                | (Registered, Exited)
                | (Entered, Exited)
                | (Waiting, Exited)
                | (Polling, Exited)
        )
    }
}

/// A worker thread owned by a process pool.
#[derive(Debug)]
pub struct WorkerThread {
    id: ThreadId,
    state: LooperState,
    reserved: bool,
    todo: VecDeque<WorkItem>,
    need_return: bool,
}

impl WorkerThread {
    pub fn new(id: ThreadId) -> Self {
        Self {
            id,
            state: LooperState::Registered,
            reserved: false,
            todo: VecDeque::new(),
            need_return: false,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn state(&self) -> LooperState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: LooperState) {
        self.state = state;
    }

    /// True while this thread belongs to the VIP reservation.
    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    pub(crate) fn mark_reserved(&mut self) {
        self.reserved = true;
    }

    pub(crate) fn clear_reserved(&mut self) {
        self.reserved = false;
    }

    /// Items handed directly to this thread.
    pub fn private_queue(&self) -> &VecDeque<WorkItem> {
        &self.todo
    }

    pub fn push_private(&mut self, item: WorkItem) {
        self.todo.push_back(item);
    }

    pub fn pop_private(&mut self) -> Option<WorkItem> {
        self.todo.pop_front()
    }

    pub(crate) fn drain_private(&mut self) -> VecDeque<WorkItem> {
        std::mem::take(&mut self.todo)
    }

    pub fn need_return(&self) -> bool {
        self.need_return
    }

    pub fn set_need_return(&mut self, need_return: bool) {
        self.need_return = need_return;
    }
}
