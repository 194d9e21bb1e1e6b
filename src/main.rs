//! Profile Pruner CLI
//!
//! Entry point for the `profile-pruner` command-line tool.

use clap::{Parser, Subcommand};
use profile_pruner::config::DEFAULT_SETTINGS_PATH;
use profile_pruner::prompt::prompt_profiles;
use profile_pruner::{
    merged_view, parse_profile_list, run_all, EffectiveConfig, Format, FsEmitter, FsProfileLoader,
};
use pruner_core::Consolidator;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "profile-pruner")]
#[command(about = "Hoist property values shared across profiles into the default profile", version)]
struct Cli {
    /// Path to settings file (default: ./config/config.toml if present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Project directory to scan for configuration files
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// Directory for pruned profiles and change logs
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered profiles and their files
    Profiles {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the merged configuration of the default profile plus the given profiles
    Show {
        /// Profiles to merge in order (e.g. "dev, prod")
        #[arg(long, short = 'p')]
        profiles: String,

        /// Only this context (default: all configured contexts)
        #[arg(long)]
        context: Option<String>,
    },

    /// Consolidate shared values into the default profile
    Prune {
        /// Profiles to consolidate (e.g. "dev; prod"); prompts when absent
        #[arg(long, short = 'p')]
        profiles: Option<String>,

        /// Only this context (default: all configured contexts)
        #[arg(long)]
        context: Option<String>,

        /// Output format for pruned profiles (yaml, properties)
        #[arg(long)]
        format: Option<String>,

        /// Plan and report without writing files
        #[arg(long)]
        dry_run: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective settings
    Settings,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format_override = match &cli.command {
        Commands::Prune { format: Some(f), .. } => Some(f.clone()),
        _ => None,
    };
    let settings = load_settings(&cli, format_override);

    match cli.command {
        Commands::Profiles { json } => run_profiles(&settings, json),
        Commands::Show { profiles, context } => run_show(&settings, &profiles, context),
        Commands::Prune {
            profiles,
            context,
            dry_run,
            json,
            ..
        } => run_prune(&settings, profiles, context, dry_run, json),
        Commands::Settings => run_settings(&settings),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_settings(cli: &Cli, format: Option<String>) -> EffectiveConfig {
    let settings_path = cli.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_SETTINGS_PATH);
        default.exists().then_some(default)
    });

    let mut app = Map::new();
    if let Some(root) = &cli.project_root {
        app.insert("project_root".to_string(), json!(root));
    }
    if let Some(dir) = &cli.output_dir {
        app.insert("output_dir".to_string(), json!(dir));
    }
    if let Some(format) = format {
        app.insert("output_format".to_string(), Value::String(format));
    }
    let overrides = (!app.is_empty()).then(|| json!({ "app": app }));

    match EffectiveConfig::build(settings_path.as_deref(), overrides) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    }
}

fn discover(settings: &EffectiveConfig) -> FsProfileLoader {
    match FsProfileLoader::discover(&settings.app) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error discovering configuration files: {}", e);
            process::exit(1);
        }
    }
}

fn select_contexts(settings: &EffectiveConfig, context: Option<String>) -> Vec<String> {
    match context {
        Some(context) if settings.app.contexts.contains(&context) => vec![context],
        Some(context) => {
            eprintln!(
                "Error: unknown context '{}' (configured: {})",
                context,
                settings.app.contexts.join(", ")
            );
            process::exit(1);
        }
        None => settings.app.contexts.clone(),
    }
}

fn run_profiles(settings: &EffectiveConfig, json_output: bool) {
    let loader = discover(settings);

    if json_output {
        let output = json!({
            "default_profile": settings.app.default_profile,
            "profiles": loader.profiles(),
            "files": loader.files(),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let profiles = loader.profiles();
    if profiles.is_empty() {
        println!("No configuration files found");
        return;
    }

    for profile in profiles {
        println!("{}", profile);
        for context in &settings.app.contexts {
            for file in loader.sources_for(&profile, context) {
                println!("  {} ({})", file.path.display(), file.format);
            }
        }
    }
}

fn run_show(settings: &EffectiveConfig, profiles: &str, context: Option<String>) {
    let loader = discover(settings);
    let default_profile = settings.app.default_profile.as_str();
    let profiles = parse_profile_list(profiles, default_profile);
    let contexts = select_contexts(settings, context);

    for context in &contexts {
        let tree = match merged_view(&loader, default_profile, &profiles, context) {
            Ok(tree) => tree,
            Err(e) => {
                eprintln!("Error loading context '{}': {}", context, e);
                process::exit(1);
            }
        };
        match Format::Yaml.render(&tree) {
            Ok(rendered) => {
                if contexts.len() > 1 {
                    println!("# {}", context);
                }
                print!("{}", rendered);
            }
            Err(e) => {
                eprintln!("Error rendering context '{}': {}", context, e);
                process::exit(1);
            }
        }
    }
}

fn run_prune(
    settings: &EffectiveConfig,
    profiles: Option<String>,
    context: Option<String>,
    dry_run: bool,
    json_output: bool,
) {
    let default_profile = settings.app.default_profile.as_str();
    let profiles = match profiles {
        Some(list) => parse_profile_list(&list, default_profile),
        None => match prompt_profiles(default_profile) {
            Ok(profiles) => profiles,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    };
    if profiles.is_empty() {
        eprintln!("Error: at least one profile other than '{}' is required", default_profile);
        process::exit(1);
    }

    let contexts = select_contexts(settings, context);
    let loader = discover(settings);
    let emitter = FsEmitter::new(&settings.app.output_dir, settings.app.output_format);
    let consolidator = Consolidator::new(default_profile);

    let run = run_all(&loader, &emitter, &consolidator, &profiles, &contexts, dry_run);

    if json_output {
        match run.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", run.to_human());
    }

    process::exit(run.exit_code().as_i32());
}

fn run_settings(settings: &EffectiveConfig) {
    match settings.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing settings: {}", e);
            process::exit(1);
        }
    }
}
