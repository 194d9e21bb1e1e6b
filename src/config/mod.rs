//! Application settings
//!
//! Implements the 3-layer settings merge:
//! 1. Built-in defaults
//! 2. Settings file (./config/config.toml or --config)
//! 3. CLI flags

mod defaults;
mod effective;

pub use defaults::BuiltinDefaults;
pub use effective::{AppSettings, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};

/// Settings file looked up when no --config is given
pub const DEFAULT_SETTINGS_PATH: &str = "config/config.toml";
