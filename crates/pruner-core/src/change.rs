//! Change records produced by the planner and consumed by the applier.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What applying a change does to its profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Key is set to `new_value`
    Set,
    /// Key is removed
    Delete,
    /// Review note only; no mutation
    Annotate,
}

/// A planned change for exactly one (profile, key) pair.
///
/// A change either deletes its key or sets it, never both. A change with
/// neither a delete flag nor a new value is an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Owning profile
    pub profile: String,

    /// Flat key the change applies to
    pub key: String,

    /// Previous value, present only for deletions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,

    /// Value to set, present only for additions/updates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,

    /// Human-readable rationale
    pub message: String,

    /// Remove the key from the profile
    pub delete: bool,
}

impl Change {
    /// Set `key` to `value` on `profile`.
    pub fn set(
        profile: impl Into<String>,
        key: impl Into<String>,
        value: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            key: key.into(),
            old_value: None,
            new_value: Some(value),
            message: message.into(),
            delete: false,
        }
    }

    /// Remove `key` (currently holding `old_value`) from `profile`.
    pub fn delete(
        profile: impl Into<String>,
        key: impl Into<String>,
        old_value: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            key: key.into(),
            old_value: Some(old_value),
            new_value: None,
            message: message.into(),
            delete: true,
        }
    }

    /// Attach a review note to `key` on `profile` without mutating it.
    pub fn annotate(
        profile: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            key: key.into(),
            old_value: None,
            new_value: None,
            message: message.into(),
            delete: false,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        if self.delete {
            ChangeKind::Delete
        } else if self.new_value.is_some() {
            ChangeKind::Set
        } else {
            ChangeKind::Annotate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kinds() {
        assert_eq!(Change::set("default", "a", json!(1), "m").kind(), ChangeKind::Set);
        assert_eq!(Change::delete("dev", "a", json!(1), "m").kind(), ChangeKind::Delete);
        assert_eq!(Change::annotate("default", "a", "m").kind(), ChangeKind::Annotate);
    }

    #[test]
    fn test_delete_carries_only_old_value() {
        let change = Change::delete("dev", "a.b", json!("x"), "hoisted");
        assert_eq!(change.old_value, Some(json!("x")));
        assert!(change.new_value.is_none());
    }

    #[test]
    fn test_serialization_omits_absent_values() {
        let json = serde_json::to_value(Change::annotate("default", "c", "differs")).unwrap();
        assert!(json.get("old_value").is_none());
        assert!(json.get("new_value").is_none());
        assert_eq!(json["delete"], false);
    }
}
