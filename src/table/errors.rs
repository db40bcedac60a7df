//! Table error types

use thiserror::Error;

use crate::document::DocId;
use crate::storage::StorageError;

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Table errors
#[derive(Debug, Error)]
pub enum TableError {
    /// The storage collaborator failed; passed through unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An explicit id collided with a stored document
    #[error("Document with ID {0} already exists")]
    DuplicateId(DocId),

    /// `remove` was called without a condition or ids
    #[error("remove() needs a condition or document ids; use truncate() to remove all documents")]
    MissingSelector,
}

impl TableError {
    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            TableError::Storage(inner) => inner.code(),
            TableError::DuplicateId(_) => "JOTDB_TABLE_DUPLICATE_ID",
            TableError::MissingSelector => "JOTDB_TABLE_MISSING_SELECTOR",
        }
    }
}
