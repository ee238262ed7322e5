// CLASSIFICATION: COMMUNITY
// Filename: selector.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Chooses the next work item for a polling thread.

use log::trace;

use crate::pool::{ProcessContext, Selection, ThreadId, WorkItem};

/// Work selection for reserved threads. Ordinary threads are left to the
/// host pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkQueueSelector;

impl WorkQueueSelector {
    pub fn select_next(&self, thread: ThreadId, ctx: &mut ProcessContext) -> Selection {
        let Some(worker) = ctx.thread_mut(thread) else {
            return Selection::Idle;
        };
        if !worker.is_reserved() {
            return Selection::Baseline;
        }
        if let Some(item) = worker.pop_private() {
            return Selection::Item(item);
        }
        match take_first_vip(ctx) {
            Some(item) => {
                trace!("reserved {thread} took VIP work {:?}", item.id());
                Selection::Item(item)
            }
            None => Selection::Idle,
        }
    }

    /// Whether `thread` has anything it is allowed to run.
    pub fn has_work(&self, thread: ThreadId, ctx: &ProcessContext) -> bool {
        let Some(worker) = ctx.thread(thread) else {
            return false;
        };
        if !worker.is_reserved() {
            return ctx.baseline_has_work(thread);
        }
        !worker.private_queue().is_empty() || worker.need_return() || ctx.has_vip_work()
    }
}

/// Move the first VIP item to the front of the process queue and pop it.
fn take_first_vip(ctx: &mut ProcessContext) -> Option<WorkItem> {
    let queue = ctx.queue_mut();
    let pos = queue.iter().position(WorkItem::is_vip)?;
    let item = queue.remove(pos)?;
    queue.push_front(item);
    queue.pop_front()
}
