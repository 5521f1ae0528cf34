//! Query result cache
//!
//! Results are stored under a key derived from the query's
//! [`CacheToken`]. Entries without a lifetime are dropped by every
//! mutation; entries with a lifetime expire on their own.

mod errors;
mod file;
mod memory;
mod store;
mod token;

pub use errors::{CacheError, CacheResult};
pub use file::FileCache;
pub use memory::MemoryCache;
pub use store::{CacheLifetime, CacheStore};
pub use token::{CacheKey, CacheToken};
