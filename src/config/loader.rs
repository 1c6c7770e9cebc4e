//! Configuration loading and discovery for `ctr.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{CtrConfig, ValidationLevel};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Config file name searched for in the working directory and its parents
pub const CONFIG_FILE_NAME: &str = "ctr.toml";

/// Directory under `$XDG_CONFIG_HOME` holding a user-wide config
pub const XDG_DIR_NAME: &str = "cacheable-tokens";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse ctr.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override automatic mode
    pub automatic: Option<bool>,
    /// Override frontend-only mode
    pub frontend_only: Option<bool>,
}

/// Find ctr.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for ctr.toml
/// 2. Check XDG_CONFIG_HOME/cacheable-tokens/ctr.toml (or ~/.config/cacheable-tokens/ctr.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find ctr.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join(XDG_DIR_NAME).join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find ctr.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a ctr.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
///
/// Only error-level validation problems fail the load. Warnings (bad
/// delimiters, unusable tokens) are logged and left for the caller to act on.
pub fn load_config(path: Option<&Path>) -> Result<CtrConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => {
            debug!("no ctr.toml found, using defaults");
            Ok(CtrConfig::default())
        }
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<CtrConfig, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration text.
pub fn parse_config(contents: &str) -> Result<CtrConfig, ConfigError> {
    let config: CtrConfig = toml::from_str(contents)?;

    let (errors, warnings): (Vec<_>, Vec<_>) =
        config.validate().into_iter().partition(|e| e.level == ValidationLevel::Error);

    for warning in &warnings {
        warn!("{}", warning);
    }
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut CtrConfig, overrides: &CliOverrides) {
    if let Some(automatic) = overrides.automatic {
        config.replacements.automatic_mode_enabled = automatic;
    }

    if let Some(frontend_only) = overrides.frontend_only {
        config.replacements.frontend_only_mode = frontend_only;
    }
}
