//! Site configuration loaded from TOML with environment overrides.
//!
//! ```toml
//! [database]
//! path = "data/site.db"
//! busy_timeout_ms = 5000
//!
//! [uploads]
//! directory = "public/images/upload"
//! public_prefix = "/images/upload"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [security]
//! bcrypt_cost = 12
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Image upload settings
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Password hashing settings
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// File path, or `:memory:` for a private in-memory database
    #[serde(default = "default_db_path")]
    pub path: String,
    /// How long a statement waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Where uploaded article images are written and how they are addressed.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory files are written into
    #[serde(default = "default_upload_dir")]
    pub directory: PathBuf,
    /// URL prefix stored in `article.path`
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Largest accepted file in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: default_upload_dir(),
            public_prefix: default_public_prefix(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Logging verbosity and output format.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Password hashing cost.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Bcrypt cost factor, 4 to 31
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

const fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("public/images/upload")
}

fn default_public_prefix() -> String {
    "/images/upload".to_string()
}

const fn default_max_bytes() -> u64 {
    5_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl SiteConfig {
    /// Reads a TOML file, applies environment overrides, and validates.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses TOML text, applies environment overrides, and validates.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let mut config: SiteConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the environment.
    ///
    /// - `NEWSDESK_DB_PATH`: `database.path`
    /// - `NEWSDESK_DB_BUSY_TIMEOUT_MS`: `database.busy_timeout_ms`
    /// - `NEWSDESK_UPLOAD_DIR`: `uploads.directory`
    /// - `NEWSDESK_LOG_LEVEL`: `logging.level`
    /// - `NEWSDESK_LOG_FORMAT`: `logging.format`
    pub fn apply_env_overrides(&mut self) -> Result<(), Error> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
        if let Some(path) = lookup("NEWSDESK_DB_PATH") {
            self.database.path = path;
        }
        if let Some(ms) = lookup("NEWSDESK_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = ms.parse().map_err(|_| {
                Error::Config(format!("invalid NEWSDESK_DB_BUSY_TIMEOUT_MS value: {ms}"))
            })?;
        }
        if let Some(dir) = lookup("NEWSDESK_UPLOAD_DIR") {
            self.uploads.directory = PathBuf::from(dir);
        }
        if let Some(level) = lookup("NEWSDESK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("NEWSDESK_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Rejects values the site cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.database.path.trim().is_empty() {
            return Err(Error::Config("database.path cannot be empty".to_string()));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(Error::Config(format!(
                "invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            )));
        }

        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(Error::Config(format!(
                "security.bcrypt_cost must be between 4 and 31, got {}",
                self.security.bcrypt_cost
            )));
        }

        if self.uploads.max_bytes == 0 {
            return Err(Error::Config("uploads.max_bytes must be positive".to_string()));
        }
        if !self.uploads.public_prefix.starts_with('/') {
            return Err(Error::Config(
                "uploads.public_prefix must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}
