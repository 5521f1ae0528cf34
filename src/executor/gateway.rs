//! Cache access around query execution
//!
//! Reads and writes honour the execution's [`CacheSettings`]; mutations
//! invalidate every entry stored without a lifetime.

use serde_json::Value;

use crate::cache::{CacheKey, CacheLifetime, CacheStore};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::query::{CacheSettings, QueryResult};

/// Applies cache settings against a cache backend
pub struct CacheGateway<'a> {
    cache: &'a dyn CacheStore,
    metrics: &'a MetricsRegistry,
}

impl<'a> CacheGateway<'a> {
    pub fn new(cache: &'a dyn CacheStore, metrics: &'a MetricsRegistry) -> Self {
        Self { cache, metrics }
    }

    /// Cached result for `key`, if caching is enabled and an entry exists.
    /// A regeneration request drops the entry before reading.
    pub fn lookup(&self, settings: &CacheSettings, key: &CacheKey) -> QueryResult<Option<Value>> {
        if !settings.use_cache {
            return Ok(None);
        }
        if settings.regenerate {
            self.cache.delete(key)?;
            log_event_with_fields(Event::CacheRegenerate, &[("key", key.as_str())]);
        }

        match self.cache.get(key)? {
            Some(content) => {
                self.metrics.increment_cache_hits();
                log_event_with_fields(Event::CacheHit, &[("key", key.as_str())]);
                Ok(Some(content))
            }
            None => {
                self.metrics.increment_cache_misses();
                log_event_with_fields(Event::CacheMiss, &[("key", key.as_str())]);
                Ok(None)
            }
        }
    }

    /// Stores `content` under `key` if caching is enabled
    pub fn store(&self, settings: &CacheSettings, key: &CacheKey, content: &Value) -> QueryResult<()> {
        if !settings.use_cache {
            return Ok(());
        }
        let lifetime = CacheLifetime::from(settings.lifetime);
        self.cache.set(key, content, lifetime)?;

        let lifetime = settings
            .lifetime
            .map_or_else(|| "none".to_string(), |secs| secs.to_string());
        log_event_with_fields(
            Event::CacheStore,
            &[("key", key.as_str()), ("lifetime", &lifetime)],
        );
        Ok(())
    }

    /// Drops every entry without a lifetime
    pub fn invalidate(&self) -> QueryResult<()> {
        self.cache.delete_all_with_no_lifetime()?;
        log_event_with_fields(Event::CacheInvalidated, &[]);
        Ok(())
    }
}
