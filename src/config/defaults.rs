//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default settings values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Root of the project to scan (default: ".")
    pub project_root: String,

    /// Resource directory under the project root (default: "src/main/resources")
    pub resource_dir: String,

    /// Where pruned files and change logs are written (default: ".")
    pub output_dir: String,

    /// Output format for pruned files (default: "yaml")
    pub output_format: String,

    /// Profile receiving hoisted values (default: "default")
    pub default_profile: String,

    /// Configuration document families (default: application, bootstrap)
    pub contexts: Vec<String>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            project_root: ".".to_string(),
            resource_dir: "src/main/resources".to_string(),
            output_dir: ".".to_string(),
            output_format: "yaml".to_string(),
            default_profile: pruner_core::DEFAULT_PROFILE.to_string(),
            contexts: vec!["application".to_string(), "bootstrap".to_string()],
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "app": {
                "project_root": self.project_root,
                "resource_dir": self.resource_dir,
                "output_dir": self.output_dir,
                "output_format": self.output_format,
                "default_profile": self.default_profile,
                "contexts": self.contexts,
                "exclude": []
            }
        })
    }
}
