//! Query construction errors
//!
//! These are usage errors. They are raised when a query is built, never
//! while it is evaluated against documents.

use thiserror::Error;

/// Result type for query construction
pub type QueryResult<T> = Result<T, QueryError>;

/// Query construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A terminal operation other than `noop` was used on an empty path
    #[error("Query has no path: select a field before '{0}'")]
    EmptyPath(&'static str),

    /// The regular expression did not compile
    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}
