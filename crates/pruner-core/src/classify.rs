//! Grouping of profiles by value for one key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::property_set::PropertySet;

/// Profiles that hold one particular value for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    /// Member profiles, in scan order
    pub profiles: Vec<String>,

    /// The value they share
    pub value: Value,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// More than one profile holds this value.
    pub fn is_shared(&self) -> bool {
        self.profiles.len() > 1
    }

    /// Smallest member name, used as the tie-break between equal-sized groups.
    pub fn first_profile(&self) -> Option<&str> {
        self.profiles.iter().map(String::as_str).min()
    }
}

/// Add `profile` to the group holding `value`, or open a new group.
pub fn add_to_groups(groups: &mut Vec<MatchGroup>, value: Value, profile: impl Into<String>) {
    let profile = profile.into();
    match groups.iter_mut().find(|group| group.value == value) {
        Some(group) => group.profiles.push(profile),
        None => groups.push(MatchGroup {
            profiles: vec![profile],
            value,
        }),
    }
}

/// Partition the non-default profiles by their value at `key`.
///
/// Groups appear in the order their value is first seen while scanning
/// `sets`. A profile missing the key is grouped under an empty string.
pub fn classify(key: &str, sets: &[PropertySet], default_profile: &str) -> Vec<MatchGroup> {
    let mut groups = Vec::new();
    for set in sets.iter().filter(|set| set.profile() != default_profile) {
        let value = set
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        add_to_groups(&mut groups, value, set.profile());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_to_groups() {
        let mut groups = Vec::new();

        add_to_groups(&mut groups, json!(4), "profile1");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[0].value, json!(4));

        add_to_groups(&mut groups, json!(4), "profile2");
        add_to_groups(&mut groups, json!(4), "profile3");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);

        add_to_groups(&mut groups, json!("anotherValue"), "profile4");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1].profiles, vec!["profile4"]);
        assert_eq!(groups[1].value, json!("anotherValue"));
    }

    #[test]
    fn test_exact_equality_only() {
        let mut groups = Vec::new();
        add_to_groups(&mut groups, json!("1"), "a");
        add_to_groups(&mut groups, json!(1), "b");
        add_to_groups(&mut groups, json!(1.0), "c");
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_structured_values_deep_compare() {
        let mut groups = Vec::new();
        add_to_groups(&mut groups, json!(["x", "y"]), "a");
        add_to_groups(&mut groups, json!(["x", "y"]), "b");
        add_to_groups(&mut groups, json!(["y", "x"]), "c");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].profiles, vec!["a", "b"]);
    }

    #[test]
    fn test_classify_excludes_default() {
        let sets = vec![
            PropertySet::from_tree("default", &json!({"k": "x"})).unwrap(),
            PropertySet::from_tree("dev", &json!({"k": "x"})).unwrap(),
            PropertySet::from_tree("prod", &json!({"k": "y"})).unwrap(),
        ];

        let groups = classify("k", &sets, "default");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].profiles, vec!["dev"]);
        assert_eq!(groups[1].profiles, vec!["prod"]);
    }

    #[test]
    fn test_missing_key_uses_empty_string() {
        let sets = vec![
            PropertySet::from_tree("dev", &json!({"k": ""})).unwrap(),
            PropertySet::from_tree("prod", &json!({})).unwrap(),
        ];

        let groups = classify("k", &sets, "default");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].value, json!(""));
        assert_eq!(groups[0].profiles, vec!["dev", "prod"]);
    }
}
