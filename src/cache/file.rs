//! File-backed cache
//!
//! One JSON file per entry: `<key>.no_lifetime.json` or
//! `<key>.<seconds>.json`. A finite entry is expired once its file is
//! older than its lifetime.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;

use super::errors::{CacheError, CacheResult};
use super::store::{CacheLifetime, CacheStore};
use super::token::CacheKey;

const NO_LIFETIME: &str = "no_lifetime";
const EXTENSION: &str = ".json";

/// Cache stored under a directory, usually `<store>/cache`
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

/// One entry file found on disk
struct Entry {
    path: PathBuf,
    lifetime: CacheLifetime,
}

impl FileCache {
    /// Opens the cache, creating its directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> CacheResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(key: &CacheKey, lifetime: CacheLifetime) -> String {
        match lifetime {
            CacheLifetime::UntilInvalidated => format!("{}.{}{}", key, NO_LIFETIME, EXTENSION),
            CacheLifetime::Seconds(s) => format!("{}.{}{}", key, s, EXTENSION),
        }
    }

    /// Parses `<key>.<lifetime>.json` into its key and lifetime
    fn parse_name(name: &str) -> Option<(&str, CacheLifetime)> {
        let stem = name.strip_suffix(EXTENSION)?;
        let (key, lifetime) = stem.split_once('.')?;
        let lifetime = match lifetime {
            NO_LIFETIME => CacheLifetime::UntilInvalidated,
            seconds => CacheLifetime::Seconds(seconds.parse().ok()?),
        };
        Some((key, lifetime))
    }

    fn entries(&self) -> CacheResult<Vec<(String, Entry)>> {
        let listing = match fs::read_dir(&self.dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };
        let mut found = Vec::new();
        for item in listing {
            let item = item.map_err(|e| CacheError::io(&self.dir, e))?;
            let name = item.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((key, lifetime)) = Self::parse_name(name) {
                found.push((
                    key.to_string(),
                    Entry {
                        path: item.path(),
                        lifetime,
                    },
                ));
            }
        }
        Ok(found)
    }

    fn entries_for(&self, key: &CacheKey) -> CacheResult<Vec<Entry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(name, _)| name == key.as_str())
            .map(|(_, entry)| entry)
            .collect())
    }

    fn is_expired(entry: &Entry) -> CacheResult<bool> {
        let Some(lifetime) = entry.lifetime.as_duration() else {
            return Ok(false);
        };
        let modified = fs::metadata(&entry.path)
            .and_then(|m| m.modified())
            .map_err(|e| CacheError::io(&entry.path, e))?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        Ok(age > lifetime)
    }

    fn remove(path: &Path) -> CacheResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        for entry in self.entries_for(key)? {
            if Self::is_expired(&entry)? {
                Self::remove(&entry.path)?;
                continue;
            }
            let content = match fs::read_to_string(&entry.path) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CacheError::io(&entry.path, e)),
            };
            // An unreadable entry is a miss
            return Ok(serde_json::from_str(&content).ok());
        }
        Ok(None)
    }

    fn set(&self, key: &CacheKey, content: &Value, lifetime: CacheLifetime) -> CacheResult<()> {
        self.delete(key)?;
        let path = self.dir.join(Self::file_name(key, lifetime));
        let encoded = serde_json::to_string(content)?;
        fs::write(&path, encoded).map_err(|e| CacheError::io(&path, e))
    }

    fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        for entry in self.entries_for(key)? {
            Self::remove(&entry.path)?;
        }
        Ok(())
    }

    fn delete_all_with_no_lifetime(&self) -> CacheResult<()> {
        for (_, entry) in self.entries()? {
            if entry.lifetime == CacheLifetime::UntilInvalidated {
                Self::remove(&entry.path)?;
            }
        }
        Ok(())
    }
}
