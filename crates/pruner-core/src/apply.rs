//! Application of planned changes to a flat property map.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::change::Change;
use crate::flatten::FlatPropertyMap;

/// Key-count accounting for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub profile: String,

    /// Keys before application
    pub starting: usize,

    /// Keys removed
    pub deleted: usize,

    /// Keys set that were not present before
    pub added: usize,

    /// Keys set that were already present
    pub updated: usize,

    /// Deletions of keys that were already absent
    pub missing_deletes: usize,

    /// Keys after application
    pub ending: usize,
}

/// The key-count identity `ending = starting - deleted + added` failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error(
    "profile '{profile}': expected {expected} keys after applying changes \
     ({starting} - {deleted} + {added}), found {ending}"
)]
pub struct ApplierInvariant {
    pub profile: String,
    pub starting: usize,
    pub deleted: usize,
    pub added: usize,
    pub expected: usize,
    pub ending: usize,
}

impl ApplyReport {
    pub fn expected_ending(&self) -> usize {
        (self.starting + self.added).saturating_sub(self.deleted)
    }

    /// Verify the key-count identity.
    pub fn check(&self) -> Result<(), ApplierInvariant> {
        let expected = self.expected_ending();
        if self.starting + self.added < self.deleted || expected != self.ending {
            return Err(ApplierInvariant {
                profile: self.profile.clone(),
                starting: self.starting,
                deleted: self.deleted,
                added: self.added,
                expected,
                ending: self.ending,
            });
        }
        Ok(())
    }
}

/// Apply `changes` to `properties`.
///
/// Deletions remove the key (an absent key is a no-op). Changes carrying a
/// new value set or overwrite the key. Annotations do nothing.
pub fn apply_changes<'a, I>(profile: &str, properties: &mut FlatPropertyMap, changes: I) -> ApplyReport
where
    I: IntoIterator<Item = &'a Change>,
{
    let mut report = ApplyReport {
        profile: profile.to_string(),
        starting: properties.len(),
        deleted: 0,
        added: 0,
        updated: 0,
        missing_deletes: 0,
        ending: 0,
    };

    for change in changes {
        if change.delete {
            if properties.remove(&change.key).is_some() {
                report.deleted += 1;
            } else {
                report.missing_deletes += 1;
            }
        } else if let Some(value) = &change.new_value {
            if properties.insert(change.key.clone(), value.clone()).is_some() {
                report.updated += 1;
            } else {
                report.added += 1;
            }
        }
    }

    report.ending = properties.len();
    debug!(
        profile,
        starting = report.starting,
        deleted = report.deleted,
        added = report.added,
        updated = report.updated,
        ending = report.ending,
        "applied changes"
    );
    report
}
