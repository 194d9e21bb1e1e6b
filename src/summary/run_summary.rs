//! Run-level aggregate over all contexts

use serde::{Deserialize, Serialize};

use super::context_summary::{ContextStatus, ContextSummary};

/// Stable process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCode {
    /// Every context consolidated (or had nothing to do)
    Success,
    /// At least one context aborted
    ContextFailed,
    /// All contexts ran, but some artifacts or invariants failed
    Degraded,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::ContextFailed => 1,
            ExitCode::Degraded => 2,
        }
    }
}

/// A context whose run aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFailure {
    pub context: String,
    pub error: String,
}

/// Summary of one consolidation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub contexts: Vec<ContextSummary>,
    pub failures: Vec<ContextFailure>,
}

impl RunSummary {
    pub fn exit_code(&self) -> ExitCode {
        if !self.failures.is_empty() {
            ExitCode::ContextFailed
        } else if self
            .contexts
            .iter()
            .any(|c| c.status == ContextStatus::Degraded)
        {
            ExitCode::Degraded
        } else {
            ExitCode::Success
        }
    }

    pub fn to_human(&self) -> String {
        let mut out = String::new();
        for context in &self.contexts {
            out.push_str(&context.to_human());
        }
        for failure in &self.failures {
            out.push_str(&format!("{}: failed: {}\n", failure.context, failure.error));
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
