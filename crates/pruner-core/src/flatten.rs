//! Flat key space conversion.
//!
//! A hierarchical tree (nested maps of scalars and lists) is flattened to a
//! map from dot-joined path to leaf value. Lists are leaves; they are never
//! exploded element-wise. An empty map is kept as a `{}` leaf so that
//! `unflatten(flatten(tree)) == tree` holds.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Path separator for flat keys.
pub const SEPARATOR: char = '.';

/// Flat mapping from dot-joined path to leaf value, ordered by key.
pub type FlatPropertyMap = BTreeMap<String, Value>;

/// A tree that cannot be represented in the flat key space.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlattenError {
    #[error("root must be a map, found {found}")]
    NotAMap { found: &'static str },

    #[error("key '{key}' under '{parent}' contains the path separator")]
    DottedKey { parent: String, key: String },

    #[error("empty key under '{parent}'")]
    EmptyKey { parent: String },
}

/// A flat map that cannot be rebuilt into a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnflattenError {
    #[error("path '{path}' is both a value and a parent of other keys")]
    PathConflict { path: String },

    #[error("flat key '{0}' has an empty segment")]
    EmptySegment(String),
}

/// Flatten a tree into its flat key space.
pub fn flatten(tree: &Value) -> Result<FlatPropertyMap, FlattenError> {
    let map = match tree {
        Value::Object(map) => map,
        other => {
            return Err(FlattenError::NotAMap {
                found: kind_name(other),
            })
        }
    };

    let mut flat = FlatPropertyMap::new();
    flatten_into(map, "", &mut flat)?;
    Ok(flat)
}

fn flatten_into(
    map: &Map<String, Value>,
    prefix: &str,
    flat: &mut FlatPropertyMap,
) -> Result<(), FlattenError> {
    for (key, value) in map {
        if key.is_empty() {
            return Err(FlattenError::EmptyKey {
                parent: prefix.to_string(),
            });
        }
        if key.contains(SEPARATOR) {
            return Err(FlattenError::DottedKey {
                parent: prefix.to_string(),
                key: key.clone(),
            });
        }

        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, SEPARATOR, key)
        };

        match value {
            Value::Object(child) if !child.is_empty() => flatten_into(child, &path, flat)?,
            leaf => {
                flat.insert(path, leaf.clone());
            }
        }
    }
    Ok(())
}

/// Rebuild a tree from a flat map.
pub fn unflatten(flat: &FlatPropertyMap) -> Result<Value, UnflattenError> {
    let mut root = Map::new();

    for (path, value) in flat {
        let segments: Vec<&str> = path.split(SEPARATOR).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(UnflattenError::EmptySegment(path.clone()));
        }

        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut current = &mut root;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(child) => child,
                _ => {
                    return Err(UnflattenError::PathConflict {
                        path: segments[..=depth].join("."),
                    })
                }
            };
        }

        match current.get(*last) {
            // An empty map leaf may coexist with nothing else under the same path.
            Some(Value::Object(existing)) if !existing.is_empty() => {
                return Err(UnflattenError::PathConflict { path: path.clone() });
            }
            Some(Value::Object(_)) | None => {}
            Some(_) => return Err(UnflattenError::PathConflict { path: path.clone() }),
        }
        current.insert(last.to_string(), value.clone());
    }

    Ok(Value::Object(root))
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
