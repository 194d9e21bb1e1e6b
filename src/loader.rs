//! Profile loading
//!
//! A loader returns the union-merged tree of every source that belongs to
//! one (profile, context) pair.

use std::fs;
use std::path::PathBuf;

use pruner_core::merge_layers;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::AppSettings;
use crate::discovery::{unique_profiles, ConfigFileMeta, Discovery, DiscoveryError};
use crate::format::{Format, FormatError};

/// Errors for profile loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no configuration found for profile '{profile}' and context '{context}'")]
    MissingProfileSource { profile: String, context: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

impl LoadError {
    pub fn is_missing(&self) -> bool {
        matches!(self, LoadError::MissingProfileSource { .. })
    }
}

/// A file that contributed to a loaded profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSource {
    pub path: PathBuf,
    pub format: Format,

    /// SHA-256 of the raw file bytes
    pub digest: String,
}

/// Merged tree for one (profile, context) pair
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: String,
    pub context: String,
    pub tree: Value,
    pub sources: Vec<ProfileSource>,
}

/// Source of per-profile property trees
pub trait ProfileLoader {
    /// Load the merged tree for `profile` in `context`.
    ///
    /// Returns `LoadError::MissingProfileSource` when nothing is configured
    /// for the pair.
    fn load(&self, profile: &str, context: &str) -> Result<LoadedProfile, LoadError>;
}

/// Loader over files discovered on disk
#[derive(Debug, Clone)]
pub struct FsProfileLoader {
    files: Vec<ConfigFileMeta>,
}

impl FsProfileLoader {
    pub fn new(files: Vec<ConfigFileMeta>) -> Self {
        Self { files }
    }

    /// Discover files under the settings' scan roots
    pub fn discover(settings: &AppSettings) -> Result<Self, DiscoveryError> {
        let files = Discovery::new(settings.contexts.clone(), settings.default_profile.as_str())?
            .with_excludes(&settings.exclude)?
            .discover(&settings.scan_roots())?;
        Ok(Self::new(files))
    }

    pub fn files(&self) -> &[ConfigFileMeta] {
        &self.files
    }

    pub fn profiles(&self) -> Vec<String> {
        unique_profiles(&self.files)
    }

    /// Files for a pair in merge order: properties before YAML, then by path.
    pub fn sources_for(&self, profile: &str, context: &str) -> Vec<&ConfigFileMeta> {
        let mut matching: Vec<&ConfigFileMeta> = self
            .files
            .iter()
            .filter(|f| f.profile == profile && f.context == context)
            .collect();
        matching.sort_by(|a, b| a.format.cmp(&b.format).then_with(|| a.path.cmp(&b.path)));
        matching
    }
}

impl ProfileLoader for FsProfileLoader {
    fn load(&self, profile: &str, context: &str) -> Result<LoadedProfile, LoadError> {
        let files = self.sources_for(profile, context);
        if files.is_empty() {
            return Err(LoadError::MissingProfileSource {
                profile: profile.to_string(),
                context: context.to_string(),
            });
        }

        let mut layers = Vec::with_capacity(files.len());
        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            let bytes = fs::read(&file.path).map_err(|source| LoadError::Io {
                path: file.path.clone(),
                source,
            })?;

            let digest = hex::encode(Sha256::digest(&bytes));
            let contents = String::from_utf8_lossy(&bytes);
            let tree = file.format.parse(&contents).map_err(|source| LoadError::Format {
                path: file.path.clone(),
                source,
            })?;

            debug!(path = %file.path.display(), %profile, %context, "loaded configuration source");
            layers.push(tree);
            sources.push(ProfileSource {
                path: file.path.clone(),
                format: file.format,
                digest,
            });
        }

        Ok(LoadedProfile {
            profile: profile.to_string(),
            context: context.to_string(),
            tree: merge_layers(layers),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn meta(path: PathBuf, profile: &str, format: Format) -> ConfigFileMeta {
        ConfigFileMeta {
            path,
            context: "application".to_string(),
            profile: profile.to_string(),
            format,
        }
    }

    #[test]
    fn test_missing_profile_source() {
        let loader = FsProfileLoader::new(Vec::new());
        let err = loader.load("dev", "application").unwrap_err();

        assert!(err.is_missing());
        assert!(err.to_string().contains("'dev'"));
    }

    #[test]
    fn test_sources_merged_yaml_over_properties() {
        let dir = TempDir::new().unwrap();
        let yml = dir.path().join("application-dev.yml");
        let props = dir.path().join("application-dev.properties");
        fs::write(&yml, "server:\n  port: 9090\n").unwrap();
        fs::write(&props, "server.port=8080\nserver.host=local\n").unwrap();

        let loader = FsProfileLoader::new(vec![
            meta(yml.clone(), "dev", Format::Yaml),
            meta(props.clone(), "dev", Format::Properties),
        ]);
        let loaded = loader.load("dev", "application").unwrap();

        assert_eq!(loaded.tree, json!({"server": {"port": 9090, "host": "local"}}));
        assert_eq!(loaded.sources.len(), 2);
        assert_eq!(loaded.sources[0].path, props);
        assert_eq!(loaded.sources[1].path, yml);
        assert_eq!(loaded.sources[0].digest.len(), 64);
    }

    #[test]
    fn test_parse_failure_names_file() {
        let dir = TempDir::new().unwrap();
        let yml = dir.path().join("application-dev.yml");
        fs::write(&yml, "a: [unclosed\n").unwrap();

        let loader = FsProfileLoader::new(vec![meta(yml, "dev", Format::Yaml)]);
        let err = loader.load("dev", "application").unwrap_err();

        assert!(matches!(err, LoadError::Format { .. }));
        assert!(err.to_string().contains("application-dev.yml"));
    }

    #[test]
    fn test_context_filter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application-dev.yml");
        fs::write(&path, "a: 1\n").unwrap();

        let loader = FsProfileLoader::new(vec![meta(path, "dev", Format::Yaml)]);
        assert!(loader.load("dev", "bootstrap").unwrap_err().is_missing());
        assert_eq!(loader.profiles(), vec!["dev"]);
    }

    #[test]
    fn test_dotted_yaml_keys_merge_with_properties() {
        let dir = TempDir::new().unwrap();
        let yml = dir.path().join("application-dev.yml");
        let props = dir.path().join("application-dev.properties");
        fs::write(&yml, "logging:\n  level:\n    org.springframework: DEBUG\n").unwrap();
        fs::write(&props, "logging.level.org.hibernate=WARN\n").unwrap();

        let loader = FsProfileLoader::new(vec![
            meta(yml, "dev", Format::Yaml),
            meta(props, "dev", Format::Properties),
        ]);
        let loaded = loader.load("dev", "application").unwrap();

        assert_eq!(
            loaded.tree,
            json!({"logging": {"level": {"org": {"springframework": "DEBUG", "hibernate": "WARN"}}}})
        );
    }
}
