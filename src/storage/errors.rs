//! Storage error types
//!
//! Error codes:
//! - FLATDOC_IO_ERROR (ERROR severity)
//! - FLATDOC_ENCODING_ERROR (ERROR severity)

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::errors::Severity;

/// Failures at the file boundary
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Directory or file is not readable at \"{}\". Please change permission.", .0.display())]
    NotReadable(PathBuf),

    #[error("Directory or file is not writable at \"{}\". Please change permission.", .0.display())]
    NotWritable(PathBuf),

    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{message}: {}", .path.display())]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Stored document is not a JSON object: {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode document: {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Create an I/O error for the given path
    pub fn io(message: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Encode { .. } => "FLATDOC_ENCODING_ERROR",
            _ => "FLATDOC_IO_ERROR",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StorageError::NotFound(PathBuf::from("/tmp/x.json"));
        assert_eq!(err.code(), "FLATDOC_IO_ERROR");
        assert_eq!(err.severity(), Severity::Error);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StorageError::Encode {
            path: PathBuf::from("/tmp/x.json"),
            source,
        };
        assert_eq!(err.code(), "FLATDOC_ENCODING_ERROR");
    }

    #[test]
    fn test_error_display_mentions_path() {
        let err = StorageError::NotWritable(PathBuf::from("/data/1.json"));
        let display = err.to_string();
        assert!(display.contains("/data/1.json"));
        assert!(display.contains("not writable"));
    }
}
