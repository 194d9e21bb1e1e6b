//! Per-profile flat property state.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::apply::{apply_changes, ApplyReport};
use crate::change::Change;
use crate::flatten::{flatten, unflatten, FlatPropertyMap, FlattenError, UnflattenError};

/// One profile's flattened properties plus the changes planned against them.
#[derive(Debug, Clone)]
pub struct PropertySet {
    profile: String,
    properties: FlatPropertyMap,
    keys: BTreeSet<String>,
    changes: BTreeMap<String, Change>,
}

impl PropertySet {
    /// Flatten `tree` into a property set for `profile`.
    pub fn from_tree(profile: impl Into<String>, tree: &Value) -> Result<Self, FlattenError> {
        Ok(Self::from_flat(profile, flatten(tree)?))
    }

    pub fn from_flat(profile: impl Into<String>, properties: FlatPropertyMap) -> Self {
        let keys = properties.keys().cloned().collect();
        Self {
            profile: profile.into(),
            properties,
            keys,
            changes: BTreeMap::new(),
        }
    }

    pub fn empty(profile: impl Into<String>) -> Self {
        Self::from_flat(profile, FlatPropertyMap::new())
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn properties(&self) -> &FlatPropertyMap {
        &self.properties
    }

    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Pending changes keyed by flat path.
    pub fn changes(&self) -> &BTreeMap<String, Change> {
        &self.changes
    }

    /// Attach a change to its key. A later change for the same key replaces
    /// the earlier one.
    pub fn record_change(&mut self, change: Change) {
        self.changes.insert(change.key.clone(), change);
    }

    /// Apply pending changes to the flat map and refresh the cached key set.
    ///
    /// The pending changes stay attached so they can be written to the
    /// per-profile change log.
    pub fn apply(&mut self) -> ApplyReport {
        let report = apply_changes(&self.profile, &mut self.properties, self.changes.values());
        self.keys = self.properties.keys().cloned().collect();
        report
    }

    /// Rebuild the hierarchical tree from the current flat map.
    pub fn to_tree(&self) -> Result<Value, UnflattenError> {
        unflatten(&self.properties)
    }
}
