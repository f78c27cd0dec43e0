//! Tickflow configuration system
//!
//! Settings for the host tick loop, runner defaults and logging, loaded from
//! TOML with per-field defaults.
//!
//! # Lookup order
//!
//! ```text
//! 1. Explicit path (CLI --config)
//! 2. $XDG_CONFIG_HOME/tickflow/config.toml
//! 3. ~/.config/tickflow/config.toml
//! 4. %APPDATA%/tickflow/config.toml
//! 5. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use tickflow::util::config::TickflowConfig;
//!
//! let config: TickflowConfig = toml::from_str("[host]\ntick_interval_ms = 5\n").unwrap();
//! assert_eq!(config.host.tick_interval_ms, 5);
//! assert_eq!(config.log.level, "info");
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TickflowConfig {
    /// Host tick loop settings
    #[serde(default)]
    pub host: HostConfig,
    /// Runner defaults
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Host tick loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    /// Sleep between ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Give up after this many ticks
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

fn default_tick_interval_ms() -> u64 {
    16
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            max_ticks: None,
        }
    }
}

impl HostConfig {
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Runner defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Deadline armed on new runners
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl RunnerConfig {
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("tickflow"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("tickflow"));
    }

    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("tickflow"));
    }

    None
}

/// Get the user config file path
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load configuration from a file
pub fn load_config_from(path: &Path) -> Result<TickflowConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load configuration
///
/// An explicit path must exist. Without one, the user config is read if
/// present, otherwise defaults are returned.
pub fn load_config(explicit: Option<&Path>) -> Result<TickflowConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    match get_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(TickflowConfig::default()),
    }
}

/// Render configuration as TOML
pub fn to_toml(config: &TickflowConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests;
