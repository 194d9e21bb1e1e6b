//! Consolidation reports
//!
//! One summary per context plus a run-level aggregate with a stable exit code.

mod context_summary;
mod run_summary;

pub use context_summary::{
    ContextStatus, ContextSummary, EmitFailure, SkippedProfile, CONTEXT_SUMMARY_SCHEMA_ID,
    CONTEXT_SUMMARY_SCHEMA_VERSION,
};
pub use run_summary::{ContextFailure, ExitCode, RunSummary};
