//! Profile Pruner - consolidate per-profile configuration files
//!
//! Discovers `{context}[-{profile}].{yml,yaml,properties}` files, hoists
//! values that several profiles share into the default profile, and writes
//! the pruned profiles alongside change logs.

pub mod config;
pub mod discovery;
pub mod emitter;
pub mod format;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod summary;

pub use config::{AppSettings, EffectiveConfig};
pub use emitter::{FsEmitter, OutputEmitter};
pub use format::Format;
pub use loader::{FsProfileLoader, LoadedProfile, ProfileLoader};
pub use pipeline::{merged_view, run_all, run_context, PipelineError};
pub use prompt::parse_profile_list;
pub use summary::{ContextSummary, RunSummary};
