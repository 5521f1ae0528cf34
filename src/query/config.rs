//! Per-execution query configuration

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::cache::CacheToken;

use super::ast::Condition;
use super::join::{JoinSource, JoinSpec};
use super::legacy::LegacyWhere;
use super::errors::QueryResult;
use crate::document::Document;

/// Sort direction of one ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Ordering clause: field path plus direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Group-by settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBySpec {
    pub group_by_fields: Vec<String>,
    #[serde(default)]
    pub count_key_name: Option<String>,
    /// Keep documents whose grouping value is null
    #[serde(default)]
    pub allow_empty: bool,
}

impl GroupBySpec {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            group_by_fields: fields.into_iter().map(Into::into).collect(),
            count_key_name: None,
            allow_empty: false,
        }
    }

    pub fn with_count_key(mut self, name: impl Into<String>) -> Self {
        self.count_key_name = Some(name.into());
        self
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

/// Aggregate function usable in a group-by select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sum" => Some(AggregateFunction::Sum),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            "avg" => Some(AggregateFunction::Avg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
        }
    }
}

/// Source of one selected output field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectField {
    Path(String),
    Aggregate {
        function: AggregateFunction,
        source: String,
    },
}

/// One entry of `fieldsToSelect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectEntry {
    pub alias: Option<String>,
    pub field: SelectField,
}

impl SelectEntry {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            field: SelectField::Path(path.into()),
        }
    }

    pub fn aliased(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            field: SelectField::Path(path.into()),
        }
    }

    pub fn aggregate(
        alias: impl Into<String>,
        function: AggregateFunction,
        source: impl Into<String>,
    ) -> Self {
        Self {
            alias: Some(alias.into()),
            field: SelectField::Aggregate {
                function,
                source: source.into(),
            },
        }
    }

    /// Output key: the alias, or the source path when none is given
    pub fn output_name(&self) -> &str {
        match (&self.alias, &self.field) {
            (Some(alias), _) => alias,
            (None, SelectField::Path(path)) => path,
            (None, SelectField::Aggregate { source, .. }) => source,
        }
    }

    pub fn to_value(&self) -> Value {
        let inner = match &self.field {
            SelectField::Path(path) => Value::String(path.clone()),
            SelectField::Aggregate { function, source } => {
                let mut map = Map::new();
                map.insert(function.as_str().to_string(), Value::String(source.clone()));
                Value::Object(map)
            }
        };
        match &self.alias {
            Some(alias) => {
                let mut map = Map::new();
                map.insert(alias.clone(), inner);
                Value::Object(map)
            }
            None => inner,
        }
    }
}

/// Full-text search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub keyword: String,
    pub fields: Vec<String>,
}

impl SearchSpec {
    pub fn new(keyword: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keyword: keyword.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Cache flags of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSettings {
    pub use_cache: bool,
    pub regenerate: bool,
    /// Seconds; `None` keeps the entry until a mutation invalidates it
    pub lifetime: Option<u64>,
}

/// Everything one query execution needs besides the store itself.
///
/// Built either directly or from a property bag with
/// [`QueryConfig::from_properties`](super::parser).
#[derive(Debug, Clone, Default)]
pub struct QueryConfig {
    pub conditions: Option<Condition>,
    pub nested_where: Option<LegacyWhere>,
    pub distinct_fields: Vec<String>,
    pub order_by: Vec<OrderClause>,
    pub skip: usize,
    pub limit: Option<usize>,
    pub group_by: Option<GroupBySpec>,
    pub having: Option<Condition>,
    pub fields_to_select: Vec<SelectEntry>,
    pub fields_to_exclude: Vec<String>,
    pub search: Option<SearchSpec>,
    pub joins: Vec<JoinSpec>,
    pub cache: CacheSettings,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conditions(mut self, condition: Condition) -> Self {
        self.conditions = Some(condition);
        self
    }

    pub fn with_nested_where(mut self, nested: LegacyWhere) -> Self {
        self.nested_where = Some(nested);
        self
    }

    pub fn with_distinct(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.distinct_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, clause: OrderClause) -> Self {
        self.order_by.push(clause);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_group_by(mut self, spec: GroupBySpec) -> Self {
        self.group_by = Some(spec);
        self
    }

    pub fn with_having(mut self, condition: Condition) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn with_select(mut self, entries: impl IntoIterator<Item = SelectEntry>) -> Self {
        self.fields_to_select.extend(entries);
        self
    }

    pub fn with_exclude(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields_to_exclude
            .extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_search(mut self, search: SearchSpec) -> Self {
        self.search = Some(search);
        self
    }

    /// Attaches the documents returned by `callback` under `property`.
    ///
    /// A callback cannot be part of a cache key, so queries carrying a join
    /// always scan and never touch the cache.
    pub fn with_join<F>(mut self, property: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Document) -> QueryResult<JoinSource> + Send + Sync + 'static,
    {
        self.joins.push(JoinSpec::new(property, callback));
        self
    }

    pub fn with_cache(mut self, lifetime: Option<u64>) -> Self {
        self.cache.use_cache = true;
        self.cache.lifetime = lifetime;
        self
    }

    pub fn disable_cache(mut self) -> Self {
        self.cache.use_cache = false;
        self
    }

    pub fn regenerate_cache(mut self) -> Self {
        self.cache.regenerate = true;
        self
    }

    /// Property bag form. Join callbacks have no wire form and are left out.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = self.shape_properties();
        props.insert("useCache".into(), Value::Bool(self.cache.use_cache));
        props.insert("regenerateCache".into(), Value::Bool(self.cache.regenerate));
        props.insert("cacheLifetime".into(), json!(self.cache.lifetime));
        props
    }

    /// Token fragments identifying the result shape of this configuration.
    /// Cache flags do not change the result and are not part of it; joins
    /// contribute only their target property names.
    pub fn cache_token(&self) -> CacheToken {
        let joins: Vec<Value> = self
            .joins
            .iter()
            .map(|join| Value::String(join.property().to_string()))
            .collect();
        self.shape_properties()
            .into_iter()
            .fold(CacheToken::new(), |token, (key, value)| token.with(key, value))
            .with("joins", Value::Array(joins))
    }

    fn shape_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert(
            "conditions".into(),
            self.conditions.as_ref().map_or(Value::Null, Condition::to_value),
        );
        props.insert(
            "nestedWhere".into(),
            self.nested_where.as_ref().map_or(Value::Null, LegacyWhere::to_value),
        );
        props.insert("distinctFields".into(), json!(self.distinct_fields));
        props.insert("orderBy".into(), json!(self.order_by));
        props.insert("skip".into(), json!(self.skip));
        props.insert("limit".into(), json!(self.limit.unwrap_or(0)));
        props.insert("groupBy".into(), json!(self.group_by));
        props.insert(
            "having".into(),
            self.having.as_ref().map_or(Value::Null, Condition::to_value),
        );
        props.insert(
            "fieldsToSelect".into(),
            Value::Array(self.fields_to_select.iter().map(SelectEntry::to_value).collect()),
        );
        props.insert("fieldsToExclude".into(), json!(self.fields_to_exclude));
        props.insert("search".into(), json!(self.search));
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_entry_output_name() {
        assert_eq!(SelectEntry::path("a.b").output_name(), "a.b");
        assert_eq!(SelectEntry::aliased("x", "a.b").output_name(), "x");
        let agg = SelectEntry::aggregate("total", AggregateFunction::Sum, "price");
        assert_eq!(agg.output_name(), "total");
        assert_eq!(agg.to_value(), json!({"total": {"sum": "price"}}));
    }

    #[test]
    fn test_aggregate_function_parse() {
        assert_eq!(AggregateFunction::parse("AVG"), Some(AggregateFunction::Avg));
        assert_eq!(AggregateFunction::parse("count"), None);
    }

    #[test]
    fn test_group_by_spec_serde_names() {
        let spec = GroupBySpec::new(["dept"]).with_count_key("n");
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"groupByFields": ["dept"], "countKeyName": "n", "allowEmpty": false})
        );
    }

    #[test]
    fn test_cache_token_ignores_cache_flags() {
        let a = QueryConfig::new().with_limit(3);
        let b = QueryConfig::new().with_limit(3).with_cache(Some(60)).regenerate_cache();
        assert_eq!(a.cache_token().key(), b.cache_token().key());
    }

    #[test]
    fn test_cache_token_depends_on_shape() {
        let a = QueryConfig::new().with_limit(3);
        let b = QueryConfig::new().with_limit(4);
        assert_ne!(a.cache_token().key(), b.cache_token().key());
    }

    #[test]
    fn test_cache_token_includes_join_properties() {
        let plain = QueryConfig::new();
        let joined = QueryConfig::new()
            .with_join("orders", |_| Ok(JoinSource::Materialized(Vec::new())));
        assert_ne!(plain.cache_token().key(), joined.cache_token().key());
    }

    #[test]
    fn test_to_properties_has_every_key() {
        let props = QueryConfig::new().to_properties();
        for key in QueryConfig::default_properties().keys() {
            assert!(props.contains_key(key), "missing {}", key);
        }
    }
}
