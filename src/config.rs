//! Configuration module for Depot.

use serde::Deserialize;
use std::path::Path;

use crate::{DepotError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_size() -> u64 {
    10
}

impl ServerConfig {
    /// Maximum request body size in bytes.
    pub fn max_body_bytes(&self) -> usize {
        let bytes = self.max_upload_size_mb.saturating_mul(1024 * 1024);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/depot.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Root directory of the byte store.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
}

fn default_storage_path() -> String {
    "/tmp/files_manager".to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
        }
    }
}

/// Where session tokens are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// In-process map; tokens do not survive a restart.
    #[default]
    Memory,
    /// `sessions` table in the metadata database.
    Database,
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokensConfig {
    /// Token store backend.
    #[serde(default)]
    pub backend: TokenBackend,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_token_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            backend: TokenBackend::default(),
            ttl_secs: default_token_ttl(),
        }
    }
}

/// Background job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Thumbnail widths generated for every uploaded image.
    #[serde(default = "default_thumbnail_widths")]
    pub thumbnail_widths: Vec<u32>,
    /// Re-enqueue images with missing thumbnails at startup.
    #[serde(default = "default_backfill_on_start")]
    pub backfill_on_start: bool,
}

fn default_thumbnail_widths() -> Vec<u32> {
    vec![500, 250, 100]
}

fn default_backfill_on_start() -> bool {
    true
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            thumbnail_widths: default_thumbnail_widths(),
            backfill_on_start: default_backfill_on_start(),
        }
    }
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
    "logs/depot.log".to_string()
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
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Session token configuration.
    #[serde(default)]
    pub tokens: TokensConfig,
    /// Background job configuration.
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DepotError::Io)?;
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
        toml::from_str(s).map_err(|e| DepotError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DEPOT_HOST`: bind address
    /// - `DEPOT_PORT`: listening port
    /// - `DEPOT_DB_PATH`: SQLite database path
    /// - `DEPOT_FOLDER_PATH`: byte store root directory
    /// - `DEPOT_LOG_LEVEL`: log level
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = lookup("DEPOT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DEPOT_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid DEPOT_PORT"),
            }
        }
        if let Some(path) = lookup("DEPOT_DB_PATH") {
            self.database.path = path;
        }
        if let Some(path) = lookup("DEPOT_FOLDER_PATH") {
            self.files.storage_path = path;
        }
        if let Some(level) = lookup("DEPOT_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the token TTL is zero or longer than ten years
    /// - a thumbnail width is zero
    /// - the storage path is empty
    pub fn validate(&self) -> Result<()> {
        if self.tokens.ttl_secs == 0 {
            return Err(DepotError::Config(
                "tokens.ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.tokens.ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(DepotError::Config(format!(
                "tokens.ttl_secs must be at most {MAX_TOKEN_TTL_SECS}"
            )));
        }
        if self.jobs.thumbnail_widths.iter().any(|w| *w == 0) {
            return Err(DepotError::Config(
                "jobs.thumbnail_widths must not contain zero".to_string(),
            ));
        }
        if self.files.storage_path.trim().is_empty() {
            return Err(DepotError::Config(
                "files.storage_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
