//! Query error types
//!
//! Error codes:
//! - FLATDOC_INVALID_ARGUMENT (ERROR)
//! - FLATDOC_INVALID_PROPERTY_ACCESS (ERROR)
//! - FLATDOC_IO_ERROR / FLATDOC_ENCODING_ERROR (ERROR, from storage)
//! - FLATDOC_CACHE_ERROR (ERROR)
//! - FLATDOC_DELETE_ABORTED (FATAL)

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;
use crate::document::PathError;
use crate::errors::Severity;
use crate::storage::StorageError;

/// Errors raised while evaluating, executing or mutating through a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed condition tree, unsupported operator, wrong-shaped value,
    /// invalid group-by pattern, invalid join result
    #[error("{0}")]
    InvalidArgument(String),

    /// A query property was requested but never set
    #[error("Tried to access query property \"{0}\" which was never set")]
    InvalidPropertyAccess(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Could not encode content: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A delete stopped partway; `deleted` files are already gone
    #[error("Unable to delete document! Already deleted documents: {deleted}. Location: \"{}\"", .path.display())]
    DeleteAborted { deleted: usize, path: PathBuf },
}

impl QueryError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        QueryError::InvalidArgument(message.into())
    }

    /// Returns the error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidArgument(_) => "FLATDOC_INVALID_ARGUMENT",
            QueryError::InvalidPropertyAccess(_) => "FLATDOC_INVALID_PROPERTY_ACCESS",
            QueryError::Storage(e) => e.code(),
            QueryError::Encoding(_) => "FLATDOC_ENCODING_ERROR",
            QueryError::Cache(e) => e.code(),
            QueryError::DeleteAborted { .. } => "FLATDOC_DELETE_ABORTED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            QueryError::DeleteAborted { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<PathError> for QueryError {
    fn from(err: PathError) -> Self {
        QueryError::InvalidArgument(err.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
