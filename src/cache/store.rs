//! Cache backend contract

use std::fmt::Debug;
use std::time::Duration;

use serde_json::Value;

use super::errors::CacheResult;
use super::token::CacheKey;

/// How long a cached result stays valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    /// Valid until a mutation invalidates it
    UntilInvalidated,
    /// Valid for a fixed duration; survives mutations
    Seconds(u64),
}

impl CacheLifetime {
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            CacheLifetime::UntilInvalidated => None,
            CacheLifetime::Seconds(s) => Some(Duration::from_secs(*s)),
        }
    }
}

impl From<Option<u64>> for CacheLifetime {
    fn from(value: Option<u64>) -> Self {
        value.map_or(CacheLifetime::UntilInvalidated, CacheLifetime::Seconds)
    }
}

/// Keyed storage for query results
pub trait CacheStore: Send + Sync + Debug {
    /// Cached result, or `None` when missing or expired
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Stores `content`, replacing any entry under the same key
    fn set(&self, key: &CacheKey, content: &Value, lifetime: CacheLifetime) -> CacheResult<()>;

    /// Drops the entry under `key`
    fn delete(&self, key: &CacheKey) -> CacheResult<()>;

    /// Drops every entry stored without a lifetime
    fn delete_all_with_no_lifetime(&self) -> CacheResult<()>;
}
