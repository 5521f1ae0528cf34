//! flatdoc - an embedded document store
//!
//! Every document is one JSON file named after its primary key. Queries
//! scan the store's data directory, filter with a condition tree, then
//! rank, join, sort, page, group or project the matches. Results can be
//! cached; updates and deletes invalidate the cache.
//!
//! ```ignore
//! use serde_json::json;
//! use flatdoc::query::Condition;
//! use flatdoc::store::{Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::new("./users"))?;
//! let adults = store
//!     .query(store.query_config().with_conditions(Condition::leaf("age", ">=", json!(18))?))
//!     .fetch()?;
//! ```

pub mod cache;
pub mod cli;
pub mod document;
pub mod errors;
pub mod executor;
pub mod observability;
pub mod query;
pub mod storage;
pub mod store;
