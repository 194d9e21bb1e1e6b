//! Per-context consolidation summary

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pruner_core::{ApplierInvariant, ApplyReport, ConsolidationOutcome};
use serde::{Deserialize, Serialize};

use crate::loader::ProfileSource;

/// Schema version for context summaries
pub const CONTEXT_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for context summaries
pub const CONTEXT_SUMMARY_SCHEMA_ID: &str = "profile-pruner/context_summary@1";

/// Outcome of one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    /// Consolidated and every artifact written
    Consolidated,
    /// Fewer than one non-default profile loaded; nothing planned
    NothingToConsolidate,
    /// Consolidated, but artifacts failed or the applier identity broke
    Degraded,
}

/// A requested profile that was left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProfile {
    pub profile: String,
    pub reason: String,
}

/// An artifact that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitFailure {
    pub profile: Option<String>,
    pub error: String,
}

/// Summary of one context's consolidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    pub context: String,

    pub created_at: DateTime<Utc>,

    pub status: ContextStatus,

    /// Planned only, nothing written
    pub dry_run: bool,

    pub default_profile: String,

    /// Non-default profiles that took part
    pub profiles: Vec<String>,

    pub skipped: Vec<SkippedProfile>,

    /// Files that fed each profile
    pub sources: BTreeMap<String, Vec<ProfileSource>>,

    /// Keys hoisted into the default profile
    pub hoisted: Vec<String>,

    /// Keys left in place with differing values
    pub divergent: Vec<String>,

    /// Shared keys left in place because they clash with a default path
    pub blocked: Vec<String>,

    /// Keys removed per donor profile
    pub deletions: BTreeMap<String, usize>,

    pub apply_reports: Vec<ApplyReport>,

    pub violations: Vec<ApplierInvariant>,

    /// Number of change records planned
    pub change_count: usize,

    pub written: Vec<PathBuf>,

    pub emit_failures: Vec<EmitFailure>,
}

impl ContextSummary {
    /// Start a summary for `context`; outcome fields are filled in by the pipeline
    pub fn new(context: impl Into<String>, default_profile: impl Into<String>, dry_run: bool) -> Self {
        Self {
            schema_version: CONTEXT_SUMMARY_SCHEMA_VERSION,
            schema_id: CONTEXT_SUMMARY_SCHEMA_ID.to_string(),
            context: context.into(),
            created_at: Utc::now(),
            status: ContextStatus::NothingToConsolidate,
            dry_run,
            default_profile: default_profile.into(),
            profiles: Vec::new(),
            skipped: Vec::new(),
            sources: BTreeMap::new(),
            hoisted: Vec::new(),
            divergent: Vec::new(),
            blocked: Vec::new(),
            deletions: BTreeMap::new(),
            apply_reports: Vec::new(),
            violations: Vec::new(),
            change_count: 0,
            written: Vec::new(),
            emit_failures: Vec::new(),
        }
    }

    /// Record the engine outcome
    pub fn record_outcome(&mut self, outcome: &ConsolidationOutcome, change_count: usize) {
        self.hoisted = outcome.hoisted.clone();
        self.divergent = outcome.divergent.clone();
        self.blocked = outcome.blocked.clone();
        self.deletions = outcome.deletions.clone();
        self.change_count = change_count;
    }

    /// Derive the final status from what was recorded
    pub fn finish(mut self) -> Self {
        self.status = if self.profiles.is_empty() {
            ContextStatus::NothingToConsolidate
        } else if !self.emit_failures.is_empty() || !self.violations.is_empty() {
            ContextStatus::Degraded
        } else {
            ContextStatus::Consolidated
        };
        self
    }

    /// One-line summary
    pub fn headline(&self) -> String {
        match self.status {
            ContextStatus::NothingToConsolidate => {
                format!("{}: nothing to consolidate", self.context)
            }
            _ => {
                let mut line = format!(
                    "{}: hoisted {} key(s) into '{}', annotated {} divergent key(s)",
                    self.context,
                    self.hoisted.len(),
                    self.default_profile,
                    self.divergent.len()
                );
                if self.status == ContextStatus::Degraded {
                    line.push_str(" (with errors)");
                }
                line
            }
        }
    }

    /// Multi-line human-readable report
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.headline());
        if self.dry_run {
            let _ = writeln!(out, "  Dry run: no files written");
        }
        if !self.profiles.is_empty() {
            let _ = writeln!(out, "  Profiles: {}", self.profiles.join(", "));
        }
        for skipped in &self.skipped {
            let _ = writeln!(out, "  Skipped {}: {}", skipped.profile, skipped.reason);
        }
        for (profile, count) in &self.deletions {
            let _ = writeln!(out, "  Deleted from {}: {}", profile, count);
        }
        if !self.divergent.is_empty() {
            let _ = writeln!(out, "  Divergent: {}", self.divergent.join(", "));
        }
        if !self.blocked.is_empty() {
            let _ = writeln!(out, "  Blocked by default paths: {}", self.blocked.join(", "));
        }
        for violation in &self.violations {
            let _ = writeln!(out, "  Invariant violated: {}", violation);
        }
        for failure in &self.emit_failures {
            let _ = writeln!(out, "  Write failed: {}", failure.error);
        }
        for path in &self.written {
            let _ = writeln!(out, "  Wrote {}", path.display());
        }
        out
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
