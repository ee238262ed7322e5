// CLASSIFICATION: COMMUNITY
// Filename: dispatcher.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Picks which waiting thread is woken for a new work item.

use log::trace;

use crate::pool::{ProcessContext, ThreadId, WaitPosition, WorkItem};

/// Keeps ordinary work off reserved threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDispatcher;

impl ThreadDispatcher {
    /// Remove and return the thread to wake for `item`, or `None` when only
    /// reserved threads are waiting and the item is ordinary.
    ///
    /// Reserved threads passed over are rotated to the tail of the waiting
    /// list, keeping their relative order.
    pub fn pick_thread(&self, item: &WorkItem, ctx: &mut ProcessContext) -> Option<ThreadId> {
        if item.is_vip() {
            return ctx.waiting_mut().pop_front();
        }
        for _ in 0..ctx.waiting().len() {
            let thread = ctx.waiting_mut().pop_front()?;
            if !ctx.is_reserved(thread) {
                return Some(thread);
            }
            trace!("skipping reserved {thread} for ordinary work {:?}", item.id());
            ctx.waiting_mut().push_back(thread);
        }
        None
    }

    /// Reserved threads always rejoin the waiting list at the tail.
    pub fn wait_position(&self, thread: ThreadId, ctx: &ProcessContext) -> Option<WaitPosition> {
        ctx.is_reserved(thread).then_some(WaitPosition::Tail)
    }
}
