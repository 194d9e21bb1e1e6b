//! Key-set intersection across the non-default profiles.

use std::collections::BTreeSet;

use crate::property_set::PropertySet;

/// Keys present in every non-default profile.
///
/// The default profile never seeds or narrows the intersection. With no
/// non-default profile the result is empty.
pub fn intersect_keys(sets: &[PropertySet], default_profile: &str) -> BTreeSet<String> {
    let candidates: Vec<&PropertySet> = sets
        .iter()
        .filter(|set| set.profile() != default_profile)
        .collect();

    // Smallest key set first keeps the retain passes short.
    let seed = match candidates
        .iter()
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.profile().cmp(b.profile())))
    {
        Some(seed) => *seed,
        None => return BTreeSet::new(),
    };

    let mut intersection = seed.keys().clone();
    for set in candidates.iter().filter(|set| set.profile() != seed.profile()) {
        if intersection.is_empty() {
            break;
        }
        intersection.retain(|key| set.contains_key(key));
    }
    intersection
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(profile: &str, tree: serde_json::Value) -> PropertySet {
        PropertySet::from_tree(profile, &tree).unwrap()
    }

    #[test]
    fn test_common_keys_only() {
        let sets = vec![
            set("dev", json!({"a": 1, "b": 2, "c": 3})),
            set("prod", json!({"a": 1, "c": 4})),
            set("qa", json!({"a": 5, "b": 2, "c": 3, "d": 0})),
        ];

        let keys = intersect_keys(&sets, "default");
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_default_profile_does_not_narrow() {
        let sets = vec![
            set("default", json!({})),
            set("dev", json!({"a": 1})),
            set("prod", json!({"a": 2})),
        ];

        let keys = intersect_keys(&sets, "default");
        assert!(keys.contains("a"));
    }

    #[test]
    fn test_default_profile_does_not_seed() {
        let sets = vec![
            set("default", json!({"only_default": 1})),
            set("dev", json!({"a": 1})),
        ];

        let keys = intersect_keys(&sets, "default");
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("a"));
    }

    #[test]
    fn test_only_default_is_empty() {
        let sets = vec![set("default", json!({"a": 1}))];
        assert!(intersect_keys(&sets, "default").is_empty());
    }

    #[test]
    fn test_single_profile_intersection_is_its_keys() {
        let sets = vec![set("dev", json!({"a": 1, "b": {"c": 2}}))];
        let keys = intersect_keys(&sets, "default");
        assert_eq!(keys.len(), 2);
    }
}
