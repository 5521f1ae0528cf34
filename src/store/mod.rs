//! Store handle
//!
//! A store is a directory: documents live in `data/` as `<key>.json`,
//! cached query results in `cache/`. [`Store`] binds that layout to a
//! storage backend, a cache backend and a metrics registry, and hands
//! out queries.

mod config;

pub use config::{ConfigError, ConfigResult, StoreConfig};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{CacheStore, FileCache};
use crate::executor::Query;
use crate::observability::MetricsRegistry;
use crate::query::{CacheSettings, QueryConfig};
use crate::storage::{DocumentStorage, LocalStorage};

struct StoreInner {
    config: StoreConfig,
    data_path: PathBuf,
    storage: Arc<dyn DocumentStorage>,
    cache: Arc<dyn CacheStore>,
    metrics: MetricsRegistry,
}

/// Cheaply cloneable handle to one store
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Opens the store on local disk, creating `data/` and `cache/` as
    /// needed
    pub fn open(config: StoreConfig) -> ConfigResult<Self> {
        config.validate()?;
        let data_path = config.data_path();
        fs::create_dir_all(&data_path).map_err(|source| ConfigError::Directory {
            path: data_path.clone(),
            source,
        })?;
        let cache = FileCache::open(config.cache_path())?;
        Self::with_backends(config, Arc::new(LocalStorage::new()), Arc::new(cache))
    }

    /// Builds a store over explicit backends; nothing is created on disk
    pub fn with_backends(
        config: StoreConfig,
        storage: Arc<dyn DocumentStorage>,
        cache: Arc<dyn CacheStore>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                data_path: config.data_path(),
                config,
                storage,
                cache,
                metrics: MetricsRegistry::new(),
            }),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn primary_key(&self) -> &str {
        self.inner.config.primary_key.trim()
    }

    pub fn data_path(&self) -> &Path {
        &self.inner.data_path
    }

    /// File backing the document whose key renders as `stem`
    pub fn document_path(&self, stem: &str) -> PathBuf {
        self.inner.data_path.join(format!("{}.json", stem))
    }

    pub fn storage(&self) -> &dyn DocumentStorage {
        self.inner.storage.as_ref()
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.inner.cache.as_ref()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.inner.metrics
    }

    /// Empty query configuration carrying this store's cache defaults
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            cache: self.default_cache_settings(),
            ..QueryConfig::default()
        }
    }

    pub fn default_cache_settings(&self) -> CacheSettings {
        CacheSettings {
            use_cache: self.inner.config.auto_cache,
            regenerate: false,
            lifetime: self.inner.config.cache_lifetime,
        }
    }

    pub fn query(&self, config: QueryConfig) -> Query {
        Query::new(self.clone(), config)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.inner.config)
            .field("storage", &self.inner.storage)
            .field("cache", &self.inner.cache)
            .finish()
    }
}
