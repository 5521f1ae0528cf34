//! In-memory cache, for tests and short-lived stores

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use serde_json::Value;

use super::errors::{CacheError, CacheResult};
use super::store::{CacheLifetime, CacheStore};
use super::token::CacheKey;

#[derive(Debug, Clone)]
struct Slot {
    content: Value,
    lifetime: CacheLifetime,
    stored_at: Instant,
}

impl Slot {
    fn is_expired(&self) -> bool {
        self.lifetime
            .as_duration()
            .is_some_and(|ttl| self.stored_at.elapsed() > ttl)
    }
}

/// Cache held in a process-local map
#[derive(Debug, Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.values().filter(|slot| !slot.is_expired()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Poisoned)?;
        match slots.get(key) {
            Some(slot) if slot.is_expired() => {
                slots.remove(key);
                Ok(None)
            }
            Some(slot) => Ok(Some(slot.content.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &CacheKey, content: &Value, lifetime: CacheLifetime) -> CacheResult<()> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Poisoned)?;
        slots.insert(
            key.clone(),
            Slot {
                content: content.clone(),
                lifetime,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }

    fn delete_all_with_no_lifetime(&self) -> CacheResult<()> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Poisoned)?;
        slots.retain(|_, slot| slot.lifetime != CacheLifetime::UntilInvalidated);
        Ok(())
    }
}
