//! Document storage subsystem for flatdoc
//!
//! Each document lives in its own file, `<data dir>/<primary key>.json`.
//! Concurrency safety is advisory and per file:
//!
//! - Reads hold a shared lock for the duration of the read
//! - Writes and read-modify-write updates hold an exclusive lock
//! - Locks block until acquired, there is no timeout
//!
//! Nothing coordinates across files. A directory scan may observe a mix of
//! states while other processes write.

mod backend;
mod errors;
mod local;

pub use backend::{DocumentStorage, DocumentTransform};
pub use errors::{StorageError, StorageResult};
pub use local::LocalStorage;
