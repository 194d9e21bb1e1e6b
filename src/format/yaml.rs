//! YAML documents

use pruner_core::{deep_merge, SEPARATOR};
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use super::FormatError;

/// Parse a single YAML document into a map tree.
///
/// An empty document is an empty map. Non-string map keys are stringified
/// and tags are dropped in favor of the tagged value. Dotted keys expand into
/// nested maps (`a.b: 1` reads as `a: {b: 1}`) and merge with their siblings;
/// on a clash the later entry wins.
pub fn parse_yaml(contents: &str) -> Result<Value, FormatError> {
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let document: YamlValue = serde_yaml::from_str(contents)?;
    match yaml_to_json(document) {
        Value::Null => Ok(Value::Object(Map::new())),
        tree @ Value::Object(_) => Ok(tree),
        Value::Array(_) => Err(FormatError::NotAMap("list")),
        _ => Err(FormatError::NotAMap("scalar")),
    }
}

/// Serialize a tree as YAML
pub fn render_yaml(tree: &Value) -> Result<String, FormatError> {
    Ok(serde_yaml::to_string(tree)?)
}

fn yaml_to_json(yaml: YamlValue) -> Value {
    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => mapping
            .into_iter()
            .fold(Value::Object(Map::new()), |tree, (k, v)| {
                deep_merge(tree, nest(&key_to_string(k), yaml_to_json(v)))
            }),
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Wrap `value` in one map per dotted segment of `key`.
///
/// Keys with empty segments stay literal.
fn nest(key: &str, value: Value) -> Value {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        return Value::Object(map);
    }
    segments.into_iter().rev().fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.to_string(), inner);
        Value::Object(map)
    })
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested() {
        let tree = parse_yaml(
            "spring:\n  datasource:\n    url: jdbc:h2:mem\n    pool: 10\n  enabled: true\nratio: 0.25\n",
        )
        .unwrap();

        assert_eq!(
            tree,
            json!({
                "spring": {"datasource": {"url": "jdbc:h2:mem", "pool": 10}, "enabled": true},
                "ratio": 0.25
            })
        );
    }

    #[test]
    fn test_parse_lists_and_null() {
        let tree = parse_yaml("hosts:\n  - a\n  - b\nempty: ~\n").unwrap();
        assert_eq!(tree, json!({"hosts": ["a", "b"], "empty": null}));
    }

    #[test]
    fn test_non_string_keys() {
        let tree = parse_yaml("codes:\n  404: missing\n  true: yes\n").unwrap();
        assert_eq!(tree["codes"]["404"], "missing");
        assert_eq!(tree["codes"]["true"], "yes");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_yaml("").unwrap(), json!({}));
        assert_eq!(parse_yaml("# only a comment\n").unwrap(), json!({}));
    }

    #[test]
    fn test_non_map_root() {
        assert!(matches!(parse_yaml("- a\n- b\n"), Err(FormatError::NotAMap("list"))));
    }

    #[test]
    fn test_render_round_trip() {
        let tree = json!({"a": {"b": "x", "c": [1, 2]}, "d": false});
        let rendered = render_yaml(&tree).unwrap();
        assert_eq!(parse_yaml(&rendered).unwrap(), tree);
    }

    #[test]
    fn test_dotted_keys_nest() {
        let tree = parse_yaml(
            "logging:\n  level:\n    org.springframework: DEBUG\n    root: INFO\nspring.datasource.url: jdbc:h2:mem\nspring:\n  jpa:\n    show-sql: true\n",
        )
        .unwrap();

        assert_eq!(
            tree,
            json!({
                "logging": {"level": {"org": {"springframework": "DEBUG"}, "root": "INFO"}},
                "spring": {"datasource": {"url": "jdbc:h2:mem"}, "jpa": {"show-sql": true}}
            })
        );
    }

    #[test]
    fn test_dotted_key_matches_properties() {
        let yaml = parse_yaml("server.port: '8080'\n").unwrap();
        let properties = crate::format::parse_properties("server.port=8080\n").unwrap();
        assert_eq!(yaml, properties);
    }

    #[test]
    fn test_empty_segment_stays_literal() {
        let tree = parse_yaml("a..b: 1\n").unwrap();
        assert_eq!(tree, json!({"a..b": 1}));
    }
}
