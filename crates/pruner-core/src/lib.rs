//! Profile property consolidation engine.
//!
//! Given one property tree per profile, values duplicated across the
//! non-default profiles are hoisted into the default profile and removed
//! from the profiles that held them. Keys whose values all differ are left
//! in place and annotated for review.

mod apply;
mod change;
mod classify;
mod engine;
mod flatten;
mod intersect;
mod merge;
mod plan;
mod property_set;

pub use apply::{apply_changes, ApplierInvariant, ApplyReport};
pub use change::{Change, ChangeKind};
pub use classify::{add_to_groups, classify, MatchGroup};
pub use engine::{ConsolidationOutcome, ConsolidationResult, Consolidator, EngineError, Plan};
pub use flatten::{flatten, unflatten, FlatPropertyMap, FlattenError, UnflattenError, SEPARATOR};
pub use intersect::intersect_keys;
pub use merge::{deep_merge, merge_layers};
pub use plan::{guard_default_paths, paths_conflict, plan_key, select_winner, KeyPlan};
pub use property_set::PropertySet;

/// Profile that receives hoisted values unless configured otherwise.
pub const DEFAULT_PROFILE: &str = "default";
