//! # Local Filesystem Backend

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;

use super::backend::{DocumentStorage, DocumentTransform};
use super::errors::{StorageError, StorageResult};
use crate::document::Document;

/// Local filesystem storage backend with advisory file locks
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a new local backend
    pub fn new() -> Self {
        Self
    }

    fn read_locked(file: &mut File, path: &Path) -> StorageResult<String> {
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| StorageError::io("Could not retrieve the content of a file", path, e))?;
        Ok(content)
    }

    fn overwrite_locked(file: &mut File, path: &Path, content: &[u8]) -> StorageResult<()> {
        let write_err = |e: std::io::Error| StorageError::io("Could not write content to file", path, e);
        file.set_len(0).map_err(write_err)?;
        file.seek(SeekFrom::Start(0)).map_err(write_err)?;
        file.write_all(content).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        Ok(())
    }
}

impl DocumentStorage for LocalStorage {
    fn check_read(&self, path: &Path) -> StorageResult<()> {
        let readable = match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => fs::read_dir(path).is_ok(),
            Ok(_) => File::open(path).is_ok(),
            Err(_) => false,
        };
        if readable {
            Ok(())
        } else {
            Err(StorageError::NotReadable(path.to_path_buf()))
        }
    }

    fn check_write(&self, path: &Path) -> StorageResult<()> {
        let target = if path.exists() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        match fs::metadata(target) {
            Ok(meta) if !meta.permissions().readonly() => Ok(()),
            _ => Err(StorageError::NotWritable(target.to_path_buf())),
        }
    }

    fn list_entries(&self, dir: &Path) -> StorageResult<Vec<String>> {
        self.check_read(dir)?;

        let entries = fs::read_dir(dir)
            .map_err(|e| StorageError::io("Could not list directory", dir, e))?;

        let mut names = Vec::new();
        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_document(&self, path: &Path) -> StorageResult<String> {
        self.check_read(path)?;
        if !path.exists() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }

        let mut file = File::open(path)
            .map_err(|e| StorageError::io("Could not open file", path, e))?;
        FileExt::lock_shared(&file)
            .map_err(|e| StorageError::io("Could not get shared lock for file", path, e))?;
        let content = Self::read_locked(&mut file, path);
        let _ = FileExt::unlock(&file);
        content
    }

    fn write_document(&self, path: &Path, content: &str) -> StorageResult<()> {
        self.check_write(path)?;

        // Truncation waits for the lock, so open without truncating.
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StorageError::io("Could not open file for writing", path, e))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| StorageError::io("Could not get exclusive lock for file", path, e))?;
        let written = Self::overwrite_locked(&mut file, path, content.as_bytes());
        let _ = FileExt::unlock(&file);
        written
    }

    fn update_document(&self, path: &Path, transform: DocumentTransform<'_>) -> StorageResult<Document> {
        self.check_read(path)?;
        self.check_write(path)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StorageError::io("Could not open file for update", path, e))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| StorageError::io("Could not get exclusive lock for file", path, e))?;

        let result = (|| -> StorageResult<Document> {
            let content = Self::read_locked(&mut file, path)?;
            let document: Document = serde_json::from_str(&content).map_err(|source| {
                StorageError::Decode {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            let updated = transform(document);
            let encoded = serde_json::to_vec(&updated).map_err(|source| StorageError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
            Self::overwrite_locked(&mut file, path, &encoded)?;
            Ok(updated)
        })();

        let _ = FileExt::unlock(&file);
        result
    }

    fn delete_document(&self, path: &Path) -> bool {
        if !path.exists() {
            return true;
        }
        if self.check_write(path).is_err() {
            return false;
        }
        fs::remove_file(path).is_ok() && !path.exists()
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
