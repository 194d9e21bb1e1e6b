//! Effective settings with provenance
//!
//! The effective config captures the merged settings plus information
//! about where each layer came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use pruner_core::merge_layers;

use super::defaults::BuiltinDefaults;
use crate::format::Format;

/// Schema version for effective settings output
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "profile-pruner/effective_settings@1";

/// Origin of a settings layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing settings layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this layer
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Typed application settings (`[app]` table)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    /// Root of the project to scan
    pub project_root: PathBuf,

    /// Extra directory of externally managed configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_properties: Option<PathBuf>,

    /// Resource directory, relative to the project root
    pub resource_dir: PathBuf,

    /// Directory receiving pruned files and change logs
    pub output_dir: PathBuf,

    /// Format of the pruned files
    pub output_format: Format,

    /// Profile receiving hoisted values
    pub default_profile: String,

    /// Configuration document families, processed independently
    pub contexts: Vec<String>,

    /// Extra glob patterns excluded from discovery
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl AppSettings {
    /// Directories scanned for configuration files
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.project_root.join(&self.resource_dir)];
        if let Some(external) = &self.external_properties {
            roots.push(external.clone());
        }
        roots
    }
}

/// Effective settings with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When these settings were computed
    pub created_at: DateTime<Utc>,

    /// The merged settings object
    pub config: Value,

    /// Typed view of the `[app]` table
    pub app: AppSettings,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build effective settings from layers
    pub fn build(
        settings_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: Settings file
        if let Some(path) = settings_path {
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        // Layer 3: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);

        let app_value = merged
            .get("app")
            .cloned()
            .ok_or_else(|| ConfigError::ValidationError("missing [app] table".to_string()))?;
        let app: AppSettings = serde_json::from_value(app_value)
            .map_err(|e| ConfigError::ParseError(format!("invalid [app] settings: {}", e)))?;

        Self::validate(&app)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            app,
            sources,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Validate settings values
    fn validate(app: &AppSettings) -> Result<(), ConfigError> {
        if app.default_profile.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_profile must not be empty".to_string(),
            ));
        }

        if app.contexts.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one context must be configured".to_string(),
            ));
        }

        for context in &app.contexts {
            if context.is_empty() || context.contains('-') || context.contains('.') {
                return Err(ConfigError::ValidationError(format!(
                    "invalid context '{}': must be non-empty without '-' or '.'",
                    context
                )));
            }
        }

        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.app.project_root, PathBuf::from("."));
        assert_eq!(config.app.output_format, Format::Yaml);
        assert_eq!(config.app.contexts, vec!["application", "bootstrap"]);
        assert!(config.app.external_properties.is_none());
    }

    #[test]
    fn test_build_with_cli_override() {
        let cli = serde_json::json!({"app": {"output_dir": "/tmp/out"}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.app.output_dir, PathBuf::from("/tmp/out"));
        // Untouched keys keep their defaults
        assert_eq!(config.app.default_profile, "default");
    }

    #[test]
    fn test_load_toml_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[app]").unwrap();
        writeln!(temp, "project_root = \"/srv/app\"").unwrap();
        writeln!(temp, "external_properties = \"/etc/app\"").unwrap();
        writeln!(temp, "output_format = \"properties\"").unwrap();
        writeln!(temp, "exclude = [\"**/legacy/**\"]").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), None).unwrap();

        assert_eq!(config.app.project_root, PathBuf::from("/srv/app"));
        assert_eq!(config.app.output_format, Format::Properties);
        assert_eq!(config.app.exclude, vec!["**/legacy/**"]);
        assert_eq!(
            config.app.scan_roots(),
            vec![
                PathBuf::from("/srv/app/src/main/resources"),
                PathBuf::from("/etc/app")
            ]
        );
    }

    #[test]
    fn test_cli_wins_over_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[app]\noutput_dir = \"from-file\"").unwrap();

        let cli = serde_json::json!({"app": {"output_dir": "from-cli"}});
        let config = EffectiveConfig::build(Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(config.app.output_dir, PathBuf::from("from-cli"));
    }

    #[test]
    fn test_sources_tracked() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[app]").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), None).unwrap();

        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
        assert_eq!(config.sources[1].origin, ConfigOrigin::File);
        assert_eq!(config.sources[1].digest.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = EffectiveConfig::build(Some(Path::new("/nonexistent/config.toml")), None);
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_validation_contexts() {
        let cli = serde_json::json!({"app": {"contexts": []}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("context"));

        let cli = serde_json::json!({"app": {"contexts": ["app-main"]}});
        assert!(EffectiveConfig::build(None, Some(cli)).is_err());
    }

    #[test]
    fn test_invalid_output_format() {
        let cli = serde_json::json!({"app": {"output_format": "xml"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
