//! Database configuration
//!
//! Loaded from a JSON file. Every field is optional:
//!
//! ```text
//! {
//!   "default_table": "_default",
//!   "query_cache_size": 10,
//!   "write_cache_size": 1000,
//!   "buffered_writes": false,
//!   "indent": null,
//!   "create_dirs": false,
//!   "log_level": "warn"
//! }
//! ```
//!
//! `query_cache_size: null` means an unbounded query cache.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::middleware::DEFAULT_WRITE_CACHE_SIZE;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::table::DEFAULT_QUERY_CACHE_SIZE;

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a `Database`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Name of the table used when none is given
    #[serde(default = "default_table_name")]
    pub default_table: String,

    /// Search results memoized per table; `None` is unbounded
    #[serde(default = "default_query_cache_size")]
    pub query_cache_size: Option<usize>,

    /// Writes buffered before a flush when `buffered_writes` is on
    #[serde(default = "default_write_cache_size")]
    pub write_cache_size: usize,

    /// Wrap the storage in a write-buffering middleware
    #[serde(default)]
    pub buffered_writes: bool,

    /// Pretty-print JSON files with this indent
    #[serde(default)]
    pub indent: Option<usize>,

    /// Create missing parent directories of the database file
    #[serde(default)]
    pub create_dirs: bool,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_table_name() -> String {
    "_default".to_string()
}
fn default_query_cache_size() -> Option<usize> {
    Some(DEFAULT_QUERY_CACHE_SIZE)
}
fn default_write_cache_size() -> usize {
    DEFAULT_WRITE_CACHE_SIZE
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default_table: default_table_name(),
            query_cache_size: default_query_cache_size(),
            write_cache_size: default_write_cache_size(),
            buffered_writes: false,
            indent: None,
            create_dirs: false,
            log_level: default_log_level(),
        }
    }
}

impl DatabaseConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: DatabaseConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", &path.display().to_string())],
        );
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_table.is_empty() {
            return Err(ConfigError::Invalid(
                "default_table must not be empty".to_string(),
            ));
        }

        if self.write_cache_size == 0 {
            return Err(ConfigError::Invalid(
                "write_cache_size must be > 0".to_string(),
            ));
        }

        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Set the process-wide log level from this config
    pub fn apply_log_level(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }
}
