//! Exclusion rules for configuration discovery

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Default patterns skipped while scanning
const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".git/**",
    "**/.git",
    "**/.git/**",
    "target",
    "**/target",
    "**/target/**",
    "build",
    "**/build",
    "**/build/**",
    "node_modules",
    "**/node_modules",
    "**/node_modules/**",
    // Our own output, when written inside a scanned root
    "*-pruned.*",
    "**/*-pruned.*",
];

/// Errors for exclusion rules
#[derive(Debug, thiserror::Error)]
pub enum ExcludeError {
    #[error("Glob pattern error: {0}")]
    GlobError(#[from] globset::Error),
}

/// Exclusion rules for filtering scanned paths
#[derive(Debug)]
pub struct ExcludeRules {
    glob_set: GlobSet,
}

impl ExcludeRules {
    /// Create exclusion rules with the defaults
    pub fn new() -> Result<Self, ExcludeError> {
        Self::with_patterns::<&str>(&[])
    }

    /// Create exclusion rules with the defaults plus `patterns`
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ExcludeError> {
        let mut builder = GlobSetBuilder::new();

        for pattern in DEFAULT_EXCLUDES {
            builder.add(Glob::new(pattern)?);
        }

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if !pattern.is_empty() {
                builder.add(Glob::new(pattern)?);
            }
        }

        Ok(Self {
            glob_set: builder.build()?,
        })
    }

    /// Check if a path (relative to its scan root) should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.glob_set.is_match(path_str.as_ref())
    }
}
