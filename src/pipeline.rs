//! Consolidation pipeline
//!
//! For each context: load the default profile and every requested profile,
//! plan and apply the consolidation, then write the artifacts.
//!
//! - A requested profile with no configuration for the context is skipped.
//! - Any other load failure, or a tree that cannot be flattened, aborts
//!   that context only.
//! - Artifact writes fail one file at a time.

use pruner_core::{merge_layers, Change, Consolidator, EngineError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::emitter::OutputEmitter;
use crate::loader::{LoadError, ProfileLoader};
use crate::summary::{ContextFailure, ContextSummary, EmitFailure, RunSummary, SkippedProfile};

/// Errors that abort one context
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("context '{context}': {source}")]
    Load {
        context: String,
        #[source]
        source: LoadError,
    },

    #[error("context '{context}': {source}")]
    Engine {
        context: String,
        #[source]
        source: EngineError,
    },
}

/// Consolidate one context.
pub fn run_context(
    loader: &dyn ProfileLoader,
    emitter: &dyn OutputEmitter,
    consolidator: &Consolidator,
    profiles: &[String],
    context: &str,
    dry_run: bool,
) -> Result<ContextSummary, PipelineError> {
    let default_profile = consolidator.default_profile();
    let mut summary = ContextSummary::new(context, default_profile, dry_run);
    let mut trees = Vec::with_capacity(profiles.len() + 1);

    match loader.load(default_profile, context) {
        Ok(loaded) => {
            summary.sources.insert(loaded.profile.clone(), loaded.sources);
            trees.push((loaded.profile, loaded.tree));
        }
        Err(err) if err.is_missing() => {
            debug!(%context, profile = %default_profile, "no default configuration, starting empty");
            trees.push((default_profile.to_string(), Value::Object(Map::new())));
        }
        Err(source) => {
            return Err(PipelineError::Load {
                context: context.to_string(),
                source,
            })
        }
    }

    for profile in profiles {
        if profile == default_profile || summary.profiles.contains(profile) {
            continue;
        }
        match loader.load(profile, context) {
            Ok(loaded) => {
                summary.profiles.push(profile.clone());
                summary.sources.insert(profile.clone(), loaded.sources);
                trees.push((loaded.profile, loaded.tree));
            }
            Err(err) if err.is_missing() => {
                warn!(%context, %profile, "skipping profile: {}", err);
                summary.skipped.push(SkippedProfile {
                    profile: profile.clone(),
                    reason: err.to_string(),
                });
            }
            Err(source) => {
                return Err(PipelineError::Load {
                    context: context.to_string(),
                    source,
                })
            }
        }
    }

    if summary.profiles.is_empty() {
        let summary = summary.finish();
        info!("{}", summary.headline());
        return Ok(summary);
    }

    let plan = consolidator.plan(trees).map_err(|source| PipelineError::Engine {
        context: context.to_string(),
        source,
    })?;
    summary.record_outcome(plan.outcome(), plan.changes().len());

    let result = plan.apply();
    summary.apply_reports = result.reports.clone();
    summary.violations = result.violations.clone();

    if !dry_run {
        for set in &result.sets {
            let profile = set.profile();

            match set.to_tree() {
                Ok(tree) => match emitter.write_profile(context, profile, &tree) {
                    Ok(path) => summary.written.push(path),
                    Err(err) => record_emit_failure(&mut summary, Some(profile), err.to_string()),
                },
                Err(err) => record_emit_failure(&mut summary, Some(profile), err.to_string()),
            }

            let changes: Vec<Change> = set.changes().values().cloned().collect();
            match emitter.write_change_log(context, profile, &changes) {
                Ok(path) => summary.written.push(path),
                Err(err) => record_emit_failure(&mut summary, Some(profile), err.to_string()),
            }
        }

        match emitter.write_global_change_log(context, &result.changes) {
            Ok(path) => summary.written.push(path),
            Err(err) => record_emit_failure(&mut summary, None, err.to_string()),
        }
    }

    let summary = summary.finish();
    info!("{}", summary.headline());
    Ok(summary)
}

fn record_emit_failure(summary: &mut ContextSummary, profile: Option<&str>, message: String) {
    error!(context = %summary.context, profile = profile.unwrap_or("-"), "{}", message);
    summary.emit_failures.push(EmitFailure {
        profile: profile.map(str::to_string),
        error: message,
    });
}

/// Consolidate every context; a failed context does not stop the rest.
pub fn run_all(
    loader: &dyn ProfileLoader,
    emitter: &dyn OutputEmitter,
    consolidator: &Consolidator,
    profiles: &[String],
    contexts: &[String],
    dry_run: bool,
) -> RunSummary {
    let mut run = RunSummary::default();
    for context in contexts {
        match run_context(loader, emitter, consolidator, profiles, context, dry_run) {
            Ok(summary) => run.contexts.push(summary),
            Err(err) => {
                error!("{}", err);
                run.failures.push(ContextFailure {
                    context: context.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    run
}

/// Union-merge the default profile and then each profile in order.
///
/// Missing profiles contribute nothing. Later profiles win on conflicts.
pub fn merged_view(
    loader: &dyn ProfileLoader,
    default_profile: &str,
    profiles: &[String],
    context: &str,
) -> Result<Value, LoadError> {
    let mut layers = Vec::with_capacity(profiles.len() + 1);
    let names = std::iter::once(default_profile).chain(
        profiles
            .iter()
            .map(String::as_str)
            .filter(|p| *p != default_profile),
    );
    for profile in names {
        match loader.load(profile, context) {
            Ok(loaded) => layers.push(loaded.tree),
            Err(err) if err.is_missing() => {
                warn!(%context, %profile, "{}", err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(merge_layers(layers))
}
