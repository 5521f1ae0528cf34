//! Query executor subsystem for flatdoc
//!
//! # Read flow (strict order)
//!
//! 1. Consult the cache; a hit returns immediately
//! 2. Scan the data directory in filename order
//! 3. Filter by condition tree, legacy nested where, distinct fields
//! 4. Rank by search keyword
//! 5. Attach joins
//! 6. Sort
//! 7. Apply skip and limit
//! 8. Aggregate (group by) or project (select, exclude)
//! 9. Store the result in the cache
//!
//! Updates and deletes select with steps 2 and 3 only, then invalidate
//! every cache entry stored without a lifetime.

mod aggregate;
mod filters;
mod gateway;
mod joiner;
mod legacy;
mod mutation;
mod pipeline;
mod projection;
mod query;
mod result;
mod scanner;
mod search;
mod sorter;

pub use aggregate::Aggregator;
pub use filters::ConditionEvaluator;
pub use gateway::CacheGateway;
pub use joiner::Joiner;
pub use legacy::LegacyEvaluator;
pub use mutation::MutationExecutor;
pub use pipeline::ResultPipeline;
pub use projection::Projector;
pub use query::Query;
pub use result::{DeleteOutcome, DeleteReturn, UpdateOutcome};
pub use scanner::{DocumentScanner, ScannedDocument};
pub use search::{similarity_percent, SearchRanker};
pub use sorter::ResultSorter;
