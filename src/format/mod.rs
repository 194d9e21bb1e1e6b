//! Configuration file formats
//!
//! Trees are `serde_json::Value` maps regardless of the on-disk format.

mod properties;
mod yaml;

pub use properties::{parse_properties, render_properties};
pub use yaml::{parse_yaml, render_yaml};

use std::fmt;
use std::path::Path;

use pruner_core::{FlattenError, UnflattenError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Flat `key=value` files
    Properties,
    /// Hierarchical YAML documents
    Yaml,
}

impl Format {
    /// Detect format from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Some(Format::Yaml),
            "properties" => Some(Format::Properties),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Extension used when writing files of this format
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Yaml => "yml",
            Format::Properties => "properties",
        }
    }

    /// Parse file contents into a tree
    pub fn parse(&self, contents: &str) -> Result<Value, FormatError> {
        match self {
            Format::Yaml => parse_yaml(contents),
            Format::Properties => parse_properties(contents),
        }
    }

    /// Serialize a tree
    pub fn render(&self, tree: &Value) -> Result<String, FormatError> {
        match self {
            Format::Yaml => render_yaml(tree),
            Format::Properties => render_properties(tree),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => write!(f, "yaml"),
            Format::Properties => write!(f, "properties"),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "properties" => Ok(Format::Properties),
            other => Err(FormatError::Unsupported(other.to_string())),
        }
    }
}

/// Errors for parsing and rendering configuration files
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("properties line {line}: {message}")]
    Properties { line: usize, message: String },

    #[error("document root must be a map, found {0}")]
    NotAMap(&'static str),

    #[error("cannot rebuild tree: {0}")]
    Unflatten(#[from] UnflattenError),

    #[error("cannot flatten tree: {0}")]
    Flatten(#[from] FlattenError),

    #[error("unsupported format '{0}' (expected yaml or properties)")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_extension() {
        assert_eq!(Format::from_extension("yml"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("YAML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("properties"), Some(Format::Properties));
        assert_eq!(Format::from_extension("json"), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("yaml".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("properties".parse::<Format>().unwrap(), Format::Properties);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_same_tree_from_either_format() {
        let yaml = Format::Yaml
            .parse("server:\n  port: \"8080\"\n  host: localhost\n")
            .unwrap();
        let props = Format::Properties
            .parse("server.port=8080\nserver.host=localhost\n")
            .unwrap();

        assert_eq!(yaml, props);
        assert_eq!(yaml, json!({"server": {"port": "8080", "host": "localhost"}}));
    }
}
