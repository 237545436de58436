//! Configuration module for filevault.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, VaultError};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// How long a store operation may wait for a connection or a lock, in seconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> String {
    "data/filevault.db".to_string()
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Number of files returned by the recent-files view.
    #[serde(default = "default_recent_files_limit")]
    pub recent_files_limit: i64,
}

fn default_max_upload_size() -> u64 {
    10
}

const BYTES_PER_MB: u64 = 1024 * 1024;

fn default_recent_files_limit() -> i64 {
    5
}

impl StorageConfig {
    /// Maximum upload size in bytes, saturating at `u64::MAX`.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size(),
            recent_files_limit: default_recent_files_limit(),
        }
    }
}

/// API token configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Shared bearer token for machine clients. Generated at startup when unset.
    #[serde(default)]
    pub token: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filevault.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// API token configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(VaultError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| VaultError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEVAULT_API_TOKEN`: Override the API token
    /// - `FILEVAULT_DATABASE_PATH`: Override the database path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("FILEVAULT_API_TOKEN") {
            if !token.is_empty() {
                self.api.token = Some(token);
            }
        }
        if let Ok(path) = std::env::var("FILEVAULT_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_upload_size_mb == 0 {
            return Err(VaultError::Config(
                "storage.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(VaultError::Config(format!(
                "storage.max_upload_size_mb must be at most {}",
                u64::MAX / BYTES_PER_MB
            )));
        }
        if self.storage.recent_files_limit <= 0 {
            return Err(VaultError::Config(
                "storage.recent_files_limit must be greater than 0".to_string(),
            ));
        }
        if let Some(ref token) = self.api.token {
            if token.trim().is_empty() {
                return Err(VaultError::Config(
                    "api.token is set but empty. Remove it to generate one at startup."
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}
