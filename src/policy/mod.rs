// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Rule table: records, generations, the double-buffered store and the
//! call classifier.

pub mod group;
pub mod matcher;
pub mod rule;
pub mod store;

pub use group::{Generation, PolicyGroup};
pub use matcher::PolicyMatcher;
pub use rule::{PolicyRule, PolicyType, RuleSpec, NO_HANDLE};
pub use store::{ActiveGroup, PolicyStore, Rebuild};
