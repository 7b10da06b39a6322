use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, DEFAULT_SERVER_URL};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "TRIVIA_CONFIG";
/// Environment override for the server URL
pub const SERVER_URL_ENV: &str = "TRIVIA_SERVER_URL";
/// Environment override for the local store path
pub const STORAGE_PATH_ENV: &str = "TRIVIA_STORAGE_PATH";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `TRIVIA_CONFIG` (if set) and apply environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => AppConfig::from_file(path)?,
            Err(_) => AppConfig::default(),
        };

        let mut builder = AppConfigBuilder::from_config(base);
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            builder = builder.server_url(url);
        }
        if let Ok(path) = std::env::var(STORAGE_PATH_ENV) {
            builder = builder.storage_path(path);
        }
        Self::with_builder(builder)
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app })
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Local store file, defaulting to the platform data directory
    pub fn storage_path(&self) -> PathBuf {
        if let Some(path) = &self.app.storage_path {
            return path.clone();
        }
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("trivia");
        path.push("local.db");
        path
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.app.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.app.probe_timeout_millis)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }

    pub fn snapshot_size(&self) -> usize {
        self.app.snapshot_size
    }

    pub fn snapshot_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.app.snapshot_refresh_secs)
    }
}
