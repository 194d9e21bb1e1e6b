//! Output artifacts
//!
//! Per context, each profile gets `{context}-{profile}-pruned.{ext}` and
//! `{context}-{profile}-pruned-changes.txt`, and the context gets one
//! `change-set-{context}.txt` listing every change in planning order.

use std::fs;
use std::path::{Path, PathBuf};

use pruner_core::Change;
use serde_json::Value;

use crate::format::{Format, FormatError};

/// Errors for writing one artifact
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Sink for consolidated profiles and change logs
pub trait OutputEmitter {
    /// Write one profile's consolidated tree
    fn write_profile(&self, context: &str, profile: &str, tree: &Value) -> Result<PathBuf, EmitError>;

    /// Write one profile's change messages
    fn write_change_log(&self, context: &str, profile: &str, changes: &[Change]) -> Result<PathBuf, EmitError>;

    /// Write every change message for a context, in planning order
    fn write_global_change_log(&self, context: &str, changes: &[Change]) -> Result<PathBuf, EmitError>;
}

pub fn profile_file_name(context: &str, profile: &str, format: Format) -> String {
    format!("{}-{}-pruned.{}", context, profile, format.extension())
}

pub fn change_log_file_name(context: &str, profile: &str) -> String {
    format!("{}-{}-pruned-changes.txt", context, profile)
}

pub fn global_change_log_file_name(context: &str) -> String {
    format!("change-set-{}.txt", context)
}

/// Emitter writing plain files into one directory
#[derive(Debug, Clone)]
pub struct FsEmitter {
    output_dir: PathBuf,
    format: Format,
}

impl FsEmitter {
    pub fn new(output_dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write(&self, file_name: String, contents: &[u8]) -> Result<PathBuf, EmitError> {
        let path = self.output_dir.join(file_name);
        fs::create_dir_all(&self.output_dir)
            .and_then(|_| fs::write(&path, contents))
            .map_err(|source| EmitError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn write_messages(&self, file_name: String, changes: &[Change]) -> Result<PathBuf, EmitError> {
        let mut buf = String::new();
        for change in changes {
            buf.push_str(&change.message);
            buf.push('\n');
        }
        self.write(file_name, buf.as_bytes())
    }
}

impl OutputEmitter for FsEmitter {
    fn write_profile(&self, context: &str, profile: &str, tree: &Value) -> Result<PathBuf, EmitError> {
        let file_name = profile_file_name(context, profile, self.format);
        let rendered = self.format.render(tree).map_err(|source| EmitError::Format {
            path: self.output_dir.join(&file_name),
            source,
        })?;
        self.write(file_name, rendered.as_bytes())
    }

    fn write_change_log(&self, context: &str, profile: &str, changes: &[Change]) -> Result<PathBuf, EmitError> {
        self.write_messages(change_log_file_name(context, profile), changes)
    }

    fn write_global_change_log(&self, context: &str, changes: &[Change]) -> Result<PathBuf, EmitError> {
        self.write_messages(global_change_log_file_name(context), changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_names() {
        assert_eq!(
            profile_file_name("application", "dev", Format::Yaml),
            "application-dev-pruned.yml"
        );
        assert_eq!(
            profile_file_name("bootstrap", "default", Format::Properties),
            "bootstrap-default-pruned.properties"
        );
        assert_eq!(change_log_file_name("application", "dev"), "application-dev-pruned-changes.txt");
        assert_eq!(global_change_log_file_name("bootstrap"), "change-set-bootstrap.txt");
    }

    #[test]
    fn test_write_profile_yaml() {
        let dir = TempDir::new().unwrap();
        let emitter = FsEmitter::new(dir.path().join("out"), Format::Yaml);

        let path = emitter
            .write_profile("application", "default", &json!({"a": {"b": "x"}}))
            .unwrap();

        assert_eq!(path, dir.path().join("out/application-default-pruned.yml"));
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(crate::format::parse_yaml(&written).unwrap(), json!({"a": {"b": "x"}}));
    }

    #[test]
    fn test_write_profile_properties() {
        let dir = TempDir::new().unwrap();
        let emitter = FsEmitter::new(dir.path(), Format::Properties);

        let path = emitter
            .write_profile("application", "dev", &json!({"server": {"port": 80}}))
            .unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "server.port=80\n");
    }

    #[test]
    fn test_change_logs_one_message_per_line() {
        let dir = TempDir::new().unwrap();
        let emitter = FsEmitter::new(dir.path(), Format::Yaml);
        let changes = vec![
            Change::set("default", "a", json!(1), "first"),
            Change::annotate("default", "b", "second"),
        ];

        let per_profile = emitter.write_change_log("application", "default", &changes).unwrap();
        let global = emitter.write_global_change_log("application", &changes).unwrap();

        assert_eq!(fs::read_to_string(per_profile).unwrap(), "first\nsecond\n");
        assert_eq!(fs::read_to_string(&global).unwrap(), "first\nsecond\n");
        assert!(global.ends_with("change-set-application.txt"));
    }

    #[test]
    fn test_write_failure_reports_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let emitter = FsEmitter::new(&blocker, Format::Yaml);
        let err = emitter.write_global_change_log("application", &[]).unwrap_err();

        assert!(matches!(err, EmitError::Io { .. }));
        assert!(err.to_string().contains("change-set-application.txt"));
    }
}
