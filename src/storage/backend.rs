//! # Storage Backend Trait

use std::fmt::Debug;
use std::path::Path;

use super::errors::StorageResult;
use crate::document::Document;

/// A pure transform applied to a document under an exclusive lock
pub type DocumentTransform<'a> = &'a dyn Fn(Document) -> Document;

/// Backend trait for document files
pub trait DocumentStorage: Send + Sync + Debug {
    /// Fails unless `path` exists and can be read
    fn check_read(&self, path: &Path) -> StorageResult<()>;

    /// Fails unless `path` (or its parent, if `path` does not exist yet)
    /// can be written
    fn check_write(&self, path: &Path) -> StorageResult<()>;

    /// Names of the regular files in `dir`, sorted
    fn list_entries(&self, dir: &Path) -> StorageResult<Vec<String>>;

    /// Read a file under a shared lock
    fn read_document(&self, path: &Path) -> StorageResult<String>;

    /// Replace a file's content under an exclusive lock
    fn write_document(&self, path: &Path, content: &str) -> StorageResult<()>;

    /// Read, transform and rewrite a document while holding one exclusive
    /// lock. Returns the document as written.
    fn update_document(&self, path: &Path, transform: DocumentTransform<'_>) -> StorageResult<Document>;

    /// Delete a file. A file that is already gone counts as deleted.
    fn delete_document(&self, path: &Path) -> bool;

    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;
}
