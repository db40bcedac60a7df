//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::io;

use thiserror::Error;

use crate::database::ConfigError;
use crate::query::QueryError;
use crate::storage::StorageError;
use crate::table::TableError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "JOTDB_CLI_CONFIG_ERROR",
            Self::Storage(e) => e.code(),
            Self::Table(e) => e.code(),
            Self::Query(_) => "JOTDB_CLI_QUERY_ERROR",
            Self::InvalidDocument(_) => "JOTDB_CLI_INVALID_DOCUMENT",
            Self::Usage(_) => "JOTDB_CLI_USAGE_ERROR",
            Self::Io(_) => "JOTDB_CLI_IO_ERROR",
            Self::Json(_) => "JOTDB_CLI_JSON_ERROR",
        }
    }
}
