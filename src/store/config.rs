//! Store configuration
//!
//! A JSON file:
//!
//! ```json
//! { "store_path": "./users", "primary_key": "_id", "auto_cache": true, "cache_lifetime": null }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::errors::Severity;
use crate::observability::{log_event_with_fields, Event};

/// Errors raised while loading a configuration or opening a store
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config \"{}\": {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),

    #[error("Could not prepare store directory \"{}\": {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } | ConfigError::Directory { .. } => "FLATDOC_IO_ERROR",
            ConfigError::Parse(_) | ConfigError::Invalid(_) => "FLATDOC_CONFIG_ERROR",
            ConfigError::Cache(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding `data/` and `cache/` (required)
    pub store_path: PathBuf,

    /// Field holding each document's unique key (default `_id`)
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Whether queries use the cache unless told otherwise (default true)
    #[serde(default = "default_auto_cache")]
    pub auto_cache: bool,

    /// Default lifetime of cached results in seconds; null keeps them until
    /// the next mutation
    #[serde(default)]
    pub cache_lifetime: Option<u64>,
}

fn default_primary_key() -> String {
    "_id".to_string()
}

fn default_auto_cache() -> bool {
    true
}

impl StoreConfig {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            primary_key: default_primary_key(),
            auto_cache: default_auto_cache(),
            cache_lifetime: None,
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_auto_cache(mut self, auto_cache: bool) -> Self {
        self.auto_cache = auto_cache;
        self
    }

    pub fn with_cache_lifetime(mut self, lifetime: Option<u64>) -> Self {
        self.cache_lifetime = lifetime;
        self
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StoreConfig = serde_json::from_str(&content)?;
        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("store_path", &config.store_path.display().to_string())],
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("store_path must not be empty"));
        }

        let key = self.primary_key.trim();
        if key.is_empty() {
            return Err(ConfigError::invalid("primary_key must not be empty"));
        }
        if key.contains('.') {
            return Err(ConfigError::invalid(format!(
                "Invalid primary_key: '{}'. Nested fields can not be primary keys.",
                self.primary_key
            )));
        }

        if self.cache_lifetime == Some(0) {
            return Err(ConfigError::invalid("cache_lifetime must be > 0 or null"));
        }

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        self.store_path.join("data")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.store_path.join("cache")
    }
}
