//! Cache tokens and keys
//!
//! A token collects the fragments that identify one query execution. It is
//! passed by value and extended with [`CacheToken::with`]; the lookup key
//! is derived from the final token only.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Ordered set of identity fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheToken {
    fragments: BTreeMap<String, Value>,
}

impl CacheToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fragments.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fragments.get(key)
    }

    /// Lookup key: SHA-256 over the JSON-encoded fragments, hex encoded
    pub fn key(&self) -> CacheKey {
        let mut hasher = Sha256::new();
        for (name, value) in &self.fragments {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.to_string().as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        CacheKey(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }
}

/// Hex digest naming one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_stable_hex() {
        let token = CacheToken::new().with("limit", json!(3));
        let key = token.key();
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, CacheToken::new().with("limit", json!(3)).key());
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = CacheToken::new().with("a", json!(1)).with("b", json!(2));
        let b = CacheToken::new().with("b", json!(2)).with("a", json!(1));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_fragments_change_key() {
        let base = CacheToken::new().with("a", json!(1));
        let one = base.clone().with("oneDocument", json!(true));
        assert_ne!(base.key(), one.key());
        assert_eq!(one.get("oneDocument"), Some(&json!(true)));
    }
}
