//! Application configuration module
//!
//! Provides configuration types for the quiz client. Values come from an
//! optional TOML file and the builder; every field has a default so an
//! empty file is a valid configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default remote trivia server
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;
const DEFAULT_PROBE_TIMEOUT_MILLIS: u64 = 3_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SNAPSHOT_SIZE: usize = 5;
const DEFAULT_SNAPSHOT_REFRESH_SECS: u64 = 3_600;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Server URL
    pub server_url: Option<String>,
    /// Location of the local SQLite store
    pub storage_path: Option<PathBuf>,
    /// Seconds between health probes
    pub probe_interval_secs: u64,
    /// Health probe timeout
    pub probe_timeout_millis: u64,
    /// Timeout for every other API request
    pub request_timeout_secs: u64,
    /// Questions fetched per tier when refreshing the offline snapshot
    pub snapshot_size: usize,
    /// Minimum seconds between two snapshot refreshes while online
    pub snapshot_refresh_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            storage_path: None,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            probe_timeout_millis: DEFAULT_PROBE_TIMEOUT_MILLIS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            snapshot_size: DEFAULT_SNAPSHOT_SIZE,
            snapshot_refresh_secs: DEFAULT_SNAPSHOT_REFRESH_SECS,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.probe_timeout_millis == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe_timeout_millis",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.probe_timeout_millis >= self.probe_interval_secs.saturating_mul(1_000) {
            return Err(ConfigError::InvalidValue {
                field: "probe_timeout_millis",
                message: "must be shorter than probe_interval_secs".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.snapshot_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "snapshot_size",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    base: AppConfig,
}

impl AppConfigBuilder {
    /// Start from an already loaded configuration
    pub fn from_config(base: AppConfig) -> Self {
        Self { base }
    }

    /// Set the server URL
    pub fn server_url(mut self, url: String) -> Self {
        self.base.server_url = Some(url);
        self
    }

    /// Set the local store location
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base.storage_path = Some(path.into());
        self
    }

    pub fn probe_interval_secs(mut self, secs: u64) -> Self {
        self.base.probe_interval_secs = secs;
        self
    }

    pub fn probe_timeout_millis(mut self, millis: u64) -> Self {
        self.base.probe_timeout_millis = millis;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.base.request_timeout_secs = secs;
        self
    }

    pub fn snapshot_size(mut self, size: usize) -> Self {
        self.base.snapshot_size = size;
        self
    }

    pub fn snapshot_refresh_secs(mut self, secs: u64) -> Self {
        self.base.snapshot_refresh_secs = secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.base.validate()?;
        Ok(self.base)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("cannot read config file {path:?}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("cannot parse config: {0}")]
    Parse(String),
}
