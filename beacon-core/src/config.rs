//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/beacon/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/beacon/` (~/.config/beacon/)
//! - State/Logs: `$XDG_STATE_HOME/beacon/` (~/.local/state/beacon/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Collector endpoint configuration
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Tracking behavior configuration
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Collector endpoint configuration
///
/// Points the pipeline at the server that receives tracked events via
/// `POST {server_url}/api/analytics/track`.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Collector base URL (e.g., `https://collector.example.com`)
    pub server_url: Option<String>,

    /// Bearer token attached to collector requests when present.
    /// Usually set at runtime from external auth state instead.
    pub api_token: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_collector_timeout")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_token: None,
            timeout_secs: default_collector_timeout(),
        }
    }
}

impl CollectorConfig {
    /// Check if the collector has everything it needs to send events
    pub fn is_ready(&self) -> bool {
        self.server_url.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        match &self.server_url {
            None => Err(Error::Config(
                "collector.server_url is required".to_string(),
            )),
            Some(url) if url.is_empty() => {
                Err(Error::Config("collector.server_url is empty".to_string()))
            }
            Some(_) => Ok(()),
        }
    }
}

fn default_collector_timeout() -> u64 {
    30
}

/// Tracking behavior configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// Whether tracking starts enabled
    #[serde(default = "default_tracking_enabled")]
    pub enabled: bool,

    /// Quiet period before a batch flush, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum queued events before drop-oldest eviction kicks in
    #[serde(default = "default_max_queue_events")]
    pub max_queue_events: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: default_tracking_enabled(),
            debounce_ms: default_debounce_ms(),
            max_queue_events: default_max_queue_events(),
        }
    }
}

fn default_tracking_enabled() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_max_queue_events() -> usize {
    1000
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/beacon/config.toml` (~/.config/beacon/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("beacon").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/beacon/` (~/.local/state/beacon/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("beacon")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/beacon/beacon.log` (~/.local/state/beacon/beacon.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("beacon.log")
    }
}
