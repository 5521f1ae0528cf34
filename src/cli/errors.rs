//! CLI-specific error types
//!
//! Query and configuration errors keep their own codes; the CLI adds
//! codes for the request channel.

use std::io;

use thiserror::Error;

use crate::errors::Severity;
use crate::query::QueryError;
use crate::store::ConfigError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// The stdin request is not a valid request object
    #[error("Invalid request: {0}")]
    Request(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    pub fn request(message: impl Into<String>) -> Self {
        CliError::Request(message.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Query(e) => e.code(),
            CliError::Request(_) => "FLATDOC_CLI_INVALID_REQUEST",
            CliError::Io(_) => "FLATDOC_CLI_IO_ERROR",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CliError::Query(e) => e.severity(),
            _ => Severity::Error,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::request(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
