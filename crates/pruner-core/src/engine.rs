//! Consolidation run over one context's profiles.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::apply::{ApplierInvariant, ApplyReport};
use crate::change::Change;
use crate::classify::classify;
use crate::flatten::FlattenError;
use crate::intersect::intersect_keys;
use crate::plan::{guard_default_paths, plan_key, KeyPlan};
use crate::property_set::PropertySet;

/// Errors that stop a consolidation run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("profile '{profile}' cannot be flattened: {source}")]
    Flatten {
        profile: String,
        #[source]
        source: FlattenError,
    },

    #[error("profile '{0}' supplied more than once")]
    DuplicateProfile(String),
}

/// Per-key decision counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationOutcome {
    /// Keys hoisted into the default profile
    pub hoisted: Vec<String>,

    /// Keys present everywhere with no shared value
    pub divergent: Vec<String>,

    /// Shared keys left in place because the default profile holds a
    /// parent or child path
    pub blocked: Vec<String>,

    /// Planned deletions per donor profile
    pub deletions: BTreeMap<String, usize>,
}

/// Runs the intersect → classify → plan → apply steps.
#[derive(Debug, Clone)]
pub struct Consolidator {
    default_profile: String,
}

impl Consolidator {
    pub fn new(default_profile: impl Into<String>) -> Self {
        Self {
            default_profile: default_profile.into(),
        }
    }

    pub fn default_profile(&self) -> &str {
        &self.default_profile
    }

    /// Flatten and plan. Nothing is applied yet.
    pub fn plan(&self, trees: Vec<(String, Value)>) -> Result<Plan, EngineError> {
        let mut sets = Vec::with_capacity(trees.len());
        for (profile, tree) in trees {
            let set = PropertySet::from_tree(profile.as_str(), &tree)
                .map_err(|source| EngineError::Flatten { profile, source })?;
            sets.push(set);
        }
        self.plan_sets(sets)
    }

    /// Plan over already flattened property sets.
    pub fn plan_sets(&self, mut sets: Vec<PropertySet>) -> Result<Plan, EngineError> {
        let mut seen = BTreeSet::new();
        for set in &sets {
            if !seen.insert(set.profile().to_string()) {
                return Err(EngineError::DuplicateProfile(set.profile().to_string()));
            }
        }
        if !seen.contains(&self.default_profile) {
            sets.push(PropertySet::empty(self.default_profile.as_str()));
        }
        sets.sort_by(|a, b| a.profile().cmp(b.profile()));

        let index: BTreeMap<String, usize> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| (set.profile().to_string(), i))
            .collect();

        let keys = intersect_keys(&sets, &self.default_profile);
        debug!(keys = keys.len(), profiles = sets.len(), "intersected key sets");

        let mut changes = Vec::new();
        let mut outcome = ConsolidationOutcome::default();

        for key in &keys {
            let groups = classify(key, &sets, &self.default_profile);
            let default_set = index.get(&self.default_profile).map(|&i| &sets[i]);
            let default_value = default_set.and_then(|set| set.get(key)).cloned();

            let plan = match plan_key(key, &groups, default_value.as_ref(), &self.default_profile) {
                Some(plan) => plan,
                None => continue,
            };
            let plan = match default_set {
                Some(set) => guard_default_paths(plan, key, set.keys(), &self.default_profile),
                None => plan,
            };

            match &plan {
                KeyPlan::Consolidate { winner, .. } => {
                    debug!(key = %key, value = %winner.value, profiles = ?winner.profiles, "hoisting shared value");
                    outcome.hoisted.push(key.clone());
                    for profile in &winner.profiles {
                        *outcome.deletions.entry(profile.clone()).or_insert(0) += 1;
                    }
                }
                KeyPlan::Divergent { .. } => {
                    debug!(key = %key, groups = groups.len(), "divergent values");
                    outcome.divergent.push(key.clone());
                }
                KeyPlan::Blocked { conflict, .. } => {
                    warn!(key = %key, %conflict, "shared value conflicts with a default profile path, not hoisting");
                    outcome.blocked.push(key.clone());
                }
            }

            for change in plan.into_changes() {
                if let Some(&i) = index.get(&change.profile) {
                    sets[i].record_change(change.clone());
                }
                changes.push(change);
            }
        }

        Ok(Plan {
            sets,
            changes,
            outcome,
        })
    }

    /// Plan and apply in one step.
    pub fn consolidate(&self, trees: Vec<(String, Value)>) -> Result<ConsolidationResult, EngineError> {
        Ok(self.plan(trees)?.apply())
    }
}

/// Planned, not yet applied, changes for one context.
#[derive(Debug, Clone)]
pub struct Plan {
    sets: Vec<PropertySet>,
    changes: Vec<Change>,
    outcome: ConsolidationOutcome,
}

impl Plan {
    /// Property sets in profile order, default included.
    pub fn sets(&self) -> &[PropertySet] {
        &self.sets
    }

    /// All changes in planning order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn outcome(&self) -> &ConsolidationOutcome {
        &self.outcome
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply every profile's changes and verify the key-count identity.
    ///
    /// A failed identity is logged and recorded; it does not stop the run.
    pub fn apply(self) -> ConsolidationResult {
        let Plan {
            mut sets,
            changes,
            outcome,
        } = self;

        let mut reports = Vec::with_capacity(sets.len());
        let mut violations = Vec::new();
        for set in &mut sets {
            let report = set.apply();
            if let Err(violation) = report.check() {
                error!(profile = %set.profile(), "{}", violation);
                violations.push(violation);
            }
            reports.push(report);
        }

        ConsolidationResult {
            sets,
            changes,
            outcome,
            reports,
            violations,
        }
    }
}

/// Consolidated profiles plus the full change log.
#[derive(Debug, Clone)]
pub struct ConsolidationResult {
    /// Updated property sets in profile order
    pub sets: Vec<PropertySet>,

    /// Every change in planning order
    pub changes: Vec<Change>,

    pub outcome: ConsolidationOutcome,

    /// One report per profile, same order as `sets`
    pub reports: Vec<ApplyReport>,

    pub violations: Vec<ApplierInvariant>,
}

impl ConsolidationResult {
    pub fn get(&self, profile: &str) -> Option<&PropertySet> {
        self.sets.iter().find(|set| set.profile() == profile)
    }

    pub fn report(&self, profile: &str) -> Option<&ApplyReport> {
        self.reports.iter().find(|report| report.profile == profile)
    }
}
