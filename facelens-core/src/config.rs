//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/facelens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/facelens/` (~/.config/facelens/)
//! - State/Logs: `$XDG_STATE_HOME/facelens/` (~/.local/state/facelens/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

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
    /// Remote analysis service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote service endpoints shared by the upload, analysis and analytics clients
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Service base URL (e.g., `https://facelens.example.com`)
    pub base_url: Option<String>,

    /// Optional bearer token passed through by the transport
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Path of the photo analysis endpoint
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,

    /// Path of the usage analytics endpoint
    #[serde(default = "default_analytics_path")]
    pub analytics_path: String,

    /// Path of the upload endpoint
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout(),
            analyze_path: default_analyze_path(),
            analytics_path: default_analytics_path(),
            upload_path: default_upload_path(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_analyze_path() -> String {
    "/api/analyze-photo".to_string()
}

fn default_analytics_path() -> String {
    "/api/analytics".to_string()
}

fn default_upload_path() -> String {
    "/api/upload".to_string()
}

impl ServiceConfig {
    /// Check if a base URL has been configured
    pub fn is_ready(&self) -> bool {
        self.base_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let base_url = match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => {
                return Err(Error::Config("service.base_url is required".to_string()));
            }
        };
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "service.base_url must start with http:// or https:// (got {})",
                base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "service.timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (key, path) in [
            ("analyze_path", &self.analyze_path),
            ("analytics_path", &self.analytics_path),
            ("upload_path", &self.upload_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "service.{} must start with '/' (got {})",
                    key, path
                )));
            }
        }
        Ok(())
    }

    /// Base URL with trailing slashes removed
    ///
    /// Call [`ServiceConfig::validate`] first; returns a config error when unset.
    pub fn base_url(&self) -> Result<String> {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .ok_or_else(|| Error::Config("service.base_url is required".to_string()))
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
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
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/facelens/config.toml` (~/.config/facelens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("facelens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/facelens/` (~/.local/state/facelens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("facelens")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/facelens/facelens.log` (~/.local/state/facelens/facelens.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("facelens.log")
    }
}
