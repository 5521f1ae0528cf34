//! Cache error types
//!
//! Every cache failure carries the code FLATDOC_CACHE_ERROR.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::errors::Severity;

/// Failures of a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed at \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cache entry could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Cache state lock poisoned")]
    Poisoned,
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        "FLATDOC_CACHE_ERROR"
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
