// CLASSIFICATION: COMMUNITY
// Filename: store.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Double-buffered rule store.
//!
//! Two generation slots, an active selector behind a reader/writer lock and
//! a separate staging lock for writers. Readers hold the active selector for
//! the whole traversal, so a commit waits for them and no reader ever walks a
//! slot that a writer is rebuilding.

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use super::group::{Generation, PolicyGroup};
use super::rule::PolicyRule;
use crate::error::{VipError, VipResult};

/// Rule store with one active and one staging generation.
#[derive(Debug)]
pub struct PolicyStore {
    slots: [RwLock<PolicyGroup>; 2],
    active: RwLock<Generation>,
    staging: Mutex<()>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    /// Empty store with `Default` active.
    pub fn new() -> Self {
        Self {
            slots: [
                RwLock::new(PolicyGroup::new(Generation::Default)),
                RwLock::new(PolicyGroup::new(Generation::AppSwitch)),
            ],
            active: RwLock::new(Generation::Default),
            staging: Mutex::new(()),
        }
    }

    /// Read guard over the active generation.
    pub fn read(&self) -> VipResult<ActiveGroup<'_>> {
        let active = self
            .active
            .read()
            .map_err(|_| VipError::LockPoisoned("policy selector"))?;
        let group = self.slots[active.slot()]
            .read()
            .map_err(|_| VipError::LockPoisoned("policy generation"))?;
        Ok(ActiveGroup {
            _active: active,
            group,
        })
    }

    pub fn active_generation(&self) -> VipResult<Generation> {
        self.active
            .read()
            .map(|g| *g)
            .map_err(|_| VipError::LockPoisoned("policy selector"))
    }

    /// Start rebuilding an inactive generation. Its previous rules are gone
    /// once this returns.
    pub fn begin_rebuild(&self, target: Generation) -> VipResult<Rebuild<'_>> {
        let staging = self
            .staging
            .lock()
            .map_err(|_| VipError::LockPoisoned("policy staging"))?;
        if self.active_generation()? == target {
            return Err(VipError::ActiveGeneration(target));
        }
        self.stage(target, staging)
    }

    /// Start rebuilding whichever generation is inactive.
    pub fn begin_rebuild_inactive(&self) -> VipResult<Rebuild<'_>> {
        let staging = self
            .staging
            .lock()
            .map_err(|_| VipError::LockPoisoned("policy staging"))?;
        let target = self.active_generation()?.other();
        self.stage(target, staging)
    }

    fn stage<'a>(&'a self, target: Generation, staging: MutexGuard<'a, ()>) -> VipResult<Rebuild<'a>> {
        let mut slot = self.slots[target.slot()]
            .write()
            .map_err(|_| VipError::LockPoisoned("policy generation"))?;
        slot.clear();
        debug!("rebuilding policy generation {target:?}");
        Ok(Rebuild {
            store: self,
            target,
            slot: Some(slot),
            committed: false,
            _staging: staging,
        })
    }

    /// Drop every rule of an inactive generation.
    pub fn clear(&self, target: Generation) -> VipResult<()> {
        let _staging = self
            .staging
            .lock()
            .map_err(|_| VipError::LockPoisoned("policy staging"))?;
        if self.active_generation()? == target {
            return Err(VipError::ActiveGeneration(target));
        }
        self.slots[target.slot()]
            .write()
            .map_err(|_| VipError::LockPoisoned("policy generation"))?
            .clear();
        debug!("cleared policy generation {target:?}");
        Ok(())
    }

    /// Make an already loaded generation active.
    pub fn switch_to(&self, target: Generation) -> VipResult<()> {
        let _staging = self
            .staging
            .lock()
            .map_err(|_| VipError::LockPoisoned("policy staging"))?;
        self.swap_active(target)
    }

    fn swap_active(&self, target: Generation) -> VipResult<()> {
        let mut active = self
            .active
            .write()
            .map_err(|_| VipError::LockPoisoned("policy selector"))?;
        let previous = *active;
        *active = target;
        info!("policy generation {previous:?} -> {target:?}");
        Ok(())
    }
}

/// The active generation, pinned for the lifetime of the guard.
pub struct ActiveGroup<'a> {
    _active: RwLockReadGuard<'a, Generation>,
    group: RwLockReadGuard<'a, PolicyGroup>,
}

impl Deref for ActiveGroup<'_> {
    type Target = PolicyGroup;

    fn deref(&self) -> &PolicyGroup {
        &self.group
    }
}

/// An in-progress rebuild holding the staging lock.
///
/// Dropping it without [`Rebuild::commit`] abandons the rebuild: the target
/// slot is left empty and the active generation is untouched.
pub struct Rebuild<'a> {
    store: &'a PolicyStore,
    target: Generation,
    slot: Option<RwLockWriteGuard<'a, PolicyGroup>>,
    committed: bool,
    _staging: MutexGuard<'a, ()>,
}

impl Rebuild<'_> {
    pub fn target(&self) -> Generation {
        self.target
    }

    /// Rules staged so far.
    pub fn len(&self) -> usize {
        self.slot.as_ref().map_or(0, |slot| slot.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_rule(&mut self, rule: PolicyRule) -> VipResult<()> {
        match self.slot.as_mut() {
            Some(slot) => slot.try_push(rule),
            None => Err(VipError::ActiveGeneration(self.target)),
        }
    }

    /// Publish the staged generation.
    pub fn commit(mut self) -> VipResult<Generation> {
        let staged = self.len();
        drop(self.slot.take());
        self.store.swap_active(self.target)?;
        self.committed = true;
        info!(
            "committed policy generation {:?} with {staged} rules",
            self.target
        );
        Ok(self.target)
    }
}

impl Drop for Rebuild<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(slot) = self.slot.as_mut() {
            slot.clear();
        }
        warn!("abandoned rebuild of policy generation {:?}", self.target);
    }
}
