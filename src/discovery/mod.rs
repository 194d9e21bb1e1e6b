//! Configuration file discovery
//!
//! Recursively scans roots for files named `{context}[-{profile}].{ext}`.
//! A file without a profile suffix belongs to the default profile.

mod exclude;

pub use exclude::{ExcludeError, ExcludeRules};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::format::Format;

/// A discovered configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFileMeta {
    /// Path to the file
    pub path: PathBuf,

    /// Document family, e.g. "application" or "bootstrap"
    pub context: String,

    /// Profile the file belongs to
    pub profile: String,

    /// File format
    pub format: Format,
}

/// Errors for discovery
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Exclude rules error: {0}")]
    ExcludeError(#[from] ExcludeError),

    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),
}

/// Split a file name into (context, profile, format).
///
/// Everything after the first `-` of the stem is the profile name.
pub fn parse_file_name(
    file_name: &str,
    contexts: &[String],
    default_profile: &str,
) -> Option<(String, String, Format)> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let format = Format::from_extension(ext)?;

    let (context, profile) = match stem.split_once('-') {
        Some((context, profile)) => (context, profile),
        None => (stem, default_profile),
    };

    if profile.is_empty() || !contexts.iter().any(|c| c == context) {
        return None;
    }

    Some((context.to_string(), profile.to_string(), format))
}

/// Scanner for configuration files
pub struct Discovery {
    contexts: Vec<String>,
    default_profile: String,
    exclude: ExcludeRules,
}

impl Discovery {
    /// Create a scanner for the given contexts
    pub fn new(contexts: Vec<String>, default_profile: impl Into<String>) -> Result<Self, DiscoveryError> {
        Ok(Self {
            contexts,
            default_profile: default_profile.into(),
            exclude: ExcludeRules::new()?,
        })
    }

    /// Add custom exclude patterns
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, DiscoveryError> {
        self.exclude = ExcludeRules::with_patterns(patterns)?;
        Ok(self)
    }

    /// Scan every root. Missing roots are skipped with a warning.
    ///
    /// Results are ordered by root, then by path.
    pub fn discover(&self, roots: &[PathBuf]) -> Result<Vec<ConfigFileMeta>, DiscoveryError> {
        let mut files = Vec::new();
        for root in roots {
            if !root.is_dir() {
                warn!(root = %root.display(), "configuration root not found, skipping");
                continue;
            }
            self.scan_root(root, &mut files)?;
        }
        Ok(files)
    }

    fn scan_root(&self, root: &Path, files: &mut Vec<ConfigFileMeta>) -> Result<(), DiscoveryError> {
        debug!(root = %root.display(), "scanning for configuration files");

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                rel.as_os_str().is_empty() || !self.exclude.is_excluded(rel)
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = match entry.file_name().to_str() {
                Some(name) => name,
                None => continue,
            };

            if let Some((context, profile, format)) =
                parse_file_name(file_name, &self.contexts, &self.default_profile)
            {
                debug!(path = %entry.path().display(), %context, %profile, "found configuration file");
                files.push(ConfigFileMeta {
                    path: entry.path().to_path_buf(),
                    context,
                    profile,
                    format,
                });
            }
        }
        Ok(())
    }
}

/// Sorted distinct profile names across discovered files
pub fn unique_profiles(files: &[ConfigFileMeta]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.profile.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn contexts() -> Vec<String> {
        vec!["application".to_string(), "bootstrap".to_string()]
    }

    #[test]
    fn test_parse_file_name() {
        let ctx = contexts();

        assert_eq!(
            parse_file_name("application.yml", &ctx, "default"),
            Some(("application".into(), "default".into(), Format::Yaml))
        );
        assert_eq!(
            parse_file_name("bootstrap-prod.properties", &ctx, "default"),
            Some(("bootstrap".into(), "prod".into(), Format::Properties))
        );
        assert_eq!(
            parse_file_name("application-us-east.yaml", &ctx, "default"),
            Some(("application".into(), "us-east".into(), Format::Yaml))
        );
    }

    #[test]
    fn test_parse_file_name_rejects() {
        let ctx = contexts();

        assert_eq!(parse_file_name("logback.xml", &ctx, "default"), None);
        assert_eq!(parse_file_name("other-dev.yml", &ctx, "default"), None);
        assert_eq!(parse_file_name("application-.yml", &ctx, "default"), None);
        assert_eq!(parse_file_name("application", &ctx, "default"), None);
        assert_eq!(parse_file_name("application.json", &ctx, "default"), None);
    }

    #[test]
    fn test_discover_recursive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(root.join("application.yml"), "a: 1\n").unwrap();
        fs::write(root.join("nested/application-dev.yml"), "a: 1\n").unwrap();
        fs::write(root.join("nested/deeper/bootstrap-prod.properties"), "a=1\n").unwrap();
        fs::write(root.join("target/application-stale.yml"), "a: 1\n").unwrap();
        fs::write(root.join("README.md"), "docs").unwrap();

        let files = Discovery::new(contexts(), "default")
            .unwrap()
            .discover(&[root.to_path_buf()])
            .unwrap();

        let found: Vec<_> = files
            .iter()
            .map(|f| (f.context.as_str(), f.profile.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("application", "default"),
                ("application", "dev"),
                ("bootstrap", "prod"),
            ]
        );
        assert_eq!(unique_profiles(&files), vec!["default", "dev", "prod"]);
    }

    #[test]
    fn test_discover_custom_excludes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("legacy")).unwrap();
        fs::write(dir.path().join("legacy/application-old.yml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("application-new.yml"), "a: 1\n").unwrap();

        let files = Discovery::new(contexts(), "default")
            .unwrap()
            .with_excludes(&["legacy"])
            .unwrap()
            .discover(&[dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].profile, "new");
    }

    #[test]
    fn test_missing_root_skipped() {
        let files = Discovery::new(contexts(), "default")
            .unwrap()
            .discover(&[PathBuf::from("/nonexistent/resources")])
            .unwrap();
        assert!(files.is_empty());
    }
}
