//! Query description
//!
//! Everything a query execution is configured with: the condition tree,
//! the deprecated nested-where tree, ordering, paging, grouping,
//! projection, search, joins and cache flags. Nothing here touches
//! storage; execution lives in [`crate::executor`].

mod ast;
mod config;
mod errors;
mod join;
mod legacy;
mod parser;

pub use ast::{parse_datetime, Condition, Connective, GroupItem, Leaf, LikePattern, Operand, Operator};
pub use config::{
    AggregateFunction, CacheSettings, GroupBySpec, OrderClause, QueryConfig, SearchSpec,
    SelectEntry, SelectField, SortDirection,
};
pub use errors::{QueryError, QueryResult};
pub use join::{DeferredFetch, JoinSource, JoinSpec};
pub use legacy::{LegacyCondition, LegacyWhere};
pub use parser::{parse_conditions, parse_leaf, parse_scalar_operand, parse_select, DATE_TAG};
pub(crate) use parser::malformed_group_select;
