//! Storage error types
//!
//! Error codes:
//! - JOTDB_STORAGE_IO_ERROR
//! - JOTDB_STORAGE_CORRUPT
//! - JOTDB_STORAGE_ENCODE_FAILED
//! - JOTDB_STORAGE_READ_ONLY
//! - JOTDB_STORAGE_CLOSED
//!
//! Storage errors surface unchanged through table operations. Nothing in
//! jotdb retries or recovers from them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Disk I/O failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The persisted data could not be decoded
    #[error("Corrupt storage file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The snapshot could not be encoded
    #[error("Failed to encode database: {0}")]
    Encode(String),

    /// Write attempted on a read-only storage
    #[error("Storage is read-only")]
    ReadOnly,

    /// Operation attempted after close
    #[error("Storage is closed")]
    Closed,
}

impl StorageError {
    /// Create an I/O error for `path`
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "JOTDB_STORAGE_IO_ERROR",
            StorageError::Corrupt { .. } => "JOTDB_STORAGE_CORRUPT",
            StorageError::Encode(_) => "JOTDB_STORAGE_ENCODE_FAILED",
            StorageError::ReadOnly => "JOTDB_STORAGE_READ_ONLY",
            StorageError::Closed => "JOTDB_STORAGE_CLOSED",
        }
    }
}
