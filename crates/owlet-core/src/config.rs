//! TOML-based application configuration.
//!
//! Holds the endpoints and tuning values the core needs at construction
//! time: the learner's timezone, the network time and reachability
//! endpoints, the document service base URL, and the XP curve.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to parse configuration contents.
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// A configuration value that parsed but cannot be used.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Time resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// IANA zone id used for unlock-date comparisons.
    #[serde(default = "default_zone")]
    pub zone: String,
    /// Network time source endpoint.
    #[serde(default = "default_time_service_url")]
    pub service_url: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            zone: default_zone(),
            service_url: default_time_service_url(),
        }
    }
}

/// Reachability probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Endpoint probed for reachability.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    /// How long a probe verdict stays fresh, in seconds.
    #[serde(default = "default_probe_cache_secs")]
    pub probe_cache_secs: u64,
    /// Supervised monitor probe interval, in seconds.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            probe_cache_secs: default_probe_cache_secs(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

/// Document service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Base URL of the document service.
    #[serde(default = "default_progress_base_url")]
    pub base_url: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            base_url: default_progress_base_url(),
        }
    }
}

/// XP curve parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default = "default_base_xp")]
    pub base_xp: i64,
    #[serde(default = "default_growth")]
    pub growth: f64,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            growth: default_growth(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub xp: XpConfig,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }
}

// Default functions

fn default_zone() -> String {
    "UTC".to_string()
}
fn default_time_service_url() -> String {
    "https://worldtimeapi.org/api/timezone/Etc/UTC".to_string()
}
fn default_probe_url() -> String {
    "https://clients3.google.com/generate_204".to_string()
}
fn default_probe_cache_secs() -> u64 {
    2
}
fn default_probe_interval_secs() -> u64 {
    30
}
fn default_progress_base_url() -> String {
    "https://progress.owlet.app/v1".to_string()
}
fn default_base_xp() -> i64 {
    10
}
fn default_growth() -> f64 {
    1.2
}
