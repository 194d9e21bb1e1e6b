//! Typed recursive merge of property trees.
//!
//! Layered sources for one profile are union-merged:
//! - Maps: deep-merge by key
//! - Lists: replaced by the overlay
//! - Scalars: overlay wins

use serde_json::Value;

/// Deep merge two trees, with `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        (_, overlay) => overlay,
    }
}

/// Merge layers in order; the first is the base, the last has highest precedence.
///
/// An empty list yields an empty map, so the result is always a valid tree root.
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(serde_json::Map::new()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(json!({"timeout": 30}), json!({"timeout": 60}));
        assert_eq!(result["timeout"], 60);
    }

    #[test]
    fn test_map_deep_merge() {
        let base = json!({"datasource": {"url": "jdbc:dev", "pool": 5}});
        let overlay = json!({"datasource": {"url": "jdbc:prod"}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["datasource"]["url"], "jdbc:prod");
        assert_eq!(result["datasource"]["pool"], 5);
    }

    #[test]
    fn test_list_replaced() {
        let result = deep_merge(json!({"hosts": ["a", "b", "c"]}), json!({"hosts": ["x"]}));
        assert_eq!(result["hosts"], json!(["x"]));
    }

    #[test]
    fn test_map_replaced_by_scalar() {
        let result = deep_merge(json!({"cache": {"ttl": 5}}), json!({"cache": "off"}));
        assert_eq!(result["cache"], "off");
    }

    #[test]
    fn test_merge_layers() {
        let result = merge_layers(vec![
            json!({"a": 1, "nested": {"x": 1, "y": 1}}),
            json!({"nested": {"y": 2}}),
            json!({"b": 3}),
        ]);

        assert_eq!(result, json!({"a": 1, "b": 3, "nested": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_merge_no_layers_is_empty_map() {
        assert_eq!(merge_layers(Vec::new()), json!({}));
    }
}
