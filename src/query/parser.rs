//! Property bag parsing
//!
//! Query builders hand their state over as a flat JSON object keyed by
//! property name. Every key must be present; a missing key is an internal
//! contract violation reported as `InvalidPropertyAccess`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::ast::{parse_datetime, Condition, Connective, GroupItem, Leaf, Operand, Operator};
use super::config::{
    AggregateFunction, CacheSettings, GroupBySpec, QueryConfig, SelectEntry, SelectField,
};
use super::errors::{QueryError, QueryResult};
use super::legacy::LegacyWhere;

/// Tag marking a date/time comparison value: `{"$date": "..."}`
pub const DATE_TAG: &str = "$date";

impl QueryConfig {
    /// Property bag of a query with nothing set
    pub fn default_properties() -> Map<String, Value> {
        QueryConfig::default().to_properties()
    }

    /// Builds a configuration from a complete property bag
    pub fn from_properties(props: &Map<String, Value>) -> QueryResult<Self> {
        let limit: u64 = decode(props, "limit")?;
        let lifetime: Option<u64> = decode(props, "cacheLifetime")?;
        let group_by: Option<GroupBySpec> = match property(props, "groupBy")? {
            Value::Object(map) if map.is_empty() => None,
            _ => decode(props, "groupBy")?,
        };

        Ok(QueryConfig {
            conditions: parse_conditions(property(props, "conditions")?)?,
            nested_where: LegacyWhere::from_json(property(props, "nestedWhere")?)?,
            distinct_fields: decode_or_default(props, "distinctFields")?,
            order_by: decode_or_default(props, "orderBy")?,
            skip: to_usize(decode(props, "skip")?),
            limit: if limit == 0 { None } else { Some(to_usize(limit)) },
            group_by,
            having: parse_conditions(property(props, "having")?)?,
            fields_to_select: parse_select(property(props, "fieldsToSelect")?)?,
            fields_to_exclude: decode_or_default(props, "fieldsToExclude")?,
            search: decode(props, "search")?,
            joins: Vec::new(),
            cache: CacheSettings {
                use_cache: decode(props, "useCache")?,
                regenerate: decode(props, "regenerateCache")?,
                lifetime,
            },
        })
    }

    /// Overlays `overrides` onto `base`; keys unknown to `base` are rejected
    pub fn merge_properties(
        mut base: Map<String, Value>,
        overrides: &Map<String, Value>,
    ) -> QueryResult<Map<String, Value>> {
        for (key, value) in overrides {
            match base.get_mut(key) {
                Some(slot) => *slot = value.clone(),
                None => {
                    return Err(QueryError::invalid_argument(format!(
                        "Unknown query property \"{}\"",
                        key
                    )))
                }
            }
        }
        Ok(base)
    }
}

fn property<'a>(props: &'a Map<String, Value>, key: &str) -> QueryResult<&'a Value> {
    props
        .get(key)
        .ok_or_else(|| QueryError::InvalidPropertyAccess(key.to_string()))
}

fn decode<T: DeserializeOwned>(props: &Map<String, Value>, key: &str) -> QueryResult<T> {
    let raw = property(props, key)?;
    serde_json::from_value(raw.clone()).map_err(|e| {
        QueryError::invalid_argument(format!("Invalid value for \"{}\": {}", key, e))
    })
}

fn decode_or_default<T: DeserializeOwned + Default>(
    props: &Map<String, Value>,
    key: &str,
) -> QueryResult<T> {
    match property(props, key)? {
        Value::Null => Ok(T::default()),
        _ => decode(props, key),
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Top-level condition array: `null` or `[]` means no conditions
pub fn parse_conditions(value: &Value) -> QueryResult<Option<Condition>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        other => Condition::from_json(other).map(Some),
    }
}

impl Condition {
    /// Parses a condition array. An array whose first two elements are
    /// strings is a leaf; any other array is a group.
    pub fn from_json(value: &Value) -> QueryResult<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(_) => {
                return Err(QueryError::invalid_argument(
                    "Malformed where statement! Associative arrays are not allowed.",
                ))
            }
            other => {
                return Err(QueryError::invalid_argument(format!(
                    "Invalid nested where statement element! Expected condition or operation, got: \"{}\"",
                    other
                )))
            }
        };

        if let (Some(Value::String(field)), Some(Value::String(operator))) =
            (items.first(), items.get(1))
        {
            if items.len() != 3 {
                return Err(QueryError::invalid_argument(
                    "Where conditions have to be [fieldName, condition, value]",
                ));
            }
            return parse_leaf(field, operator, &items[2]).map(Condition::Leaf);
        }

        let group = items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) => Condition::from_json(item).map(GroupItem::from),
                Value::String(op) => Ok(GroupItem::Connective(Connective::parse(op)?)),
                other => Err(QueryError::invalid_argument(format!(
                    "Invalid nested where statement element! Expected condition or operation, got: \"{}\"",
                    other
                ))),
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Condition::Group(group))
    }
}

/// Builds a leaf from its wire parts. List operators take their value as a
/// list of operands; every other operator takes it whole.
pub fn parse_leaf(field: &str, operator: &str, value: &Value) -> QueryResult<Leaf> {
    let parsed = Operator::parse(operator)?;
    let operand = match (parsed.takes_list(), value) {
        (true, Value::Array(items)) => Operand::List(
            items
                .iter()
                .map(parse_scalar_operand)
                .collect::<QueryResult<Vec<_>>>()?,
        ),
        _ => parse_scalar_operand(value)?,
    };
    Leaf::new(field, operator, operand)
}

/// Decodes one comparison value, recognising tagged date/times
pub fn parse_scalar_operand(value: &Value) -> QueryResult<Operand> {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            if let Some(raw) = map.get(DATE_TAG) {
                let text = raw.as_str().ok_or_else(|| {
                    QueryError::invalid_argument("Date values have to be strings")
                })?;
                return parse_datetime(text).map(Operand::DateTime).ok_or_else(|| {
                    QueryError::invalid_argument(format!("Invalid date value \"{}\"", text))
                });
            }
        }
    }
    Ok(Operand::Value(value.clone()))
}

/// Parses `fieldsToSelect`: an array of paths and `{alias: path}` /
/// `{alias: {function: path}}` objects, or a single alias object.
pub fn parse_select(value: &Value) -> QueryResult<Vec<SelectEntry>> {
    let mut entries = Vec::new();
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(path) => entries.push(SelectEntry::path(path.as_str())),
                    Value::Object(map) => {
                        for (alias, target) in map {
                            entries.push(parse_aliased(alias, target)?);
                        }
                    }
                    _ => return Err(malformed_select()),
                }
            }
        }
        Value::Object(map) => {
            for (alias, target) in map {
                entries.push(parse_aliased(alias, target)?);
            }
        }
        _ => return Err(malformed_select()),
    }
    Ok(entries)
}

fn parse_aliased(alias: &str, target: &Value) -> QueryResult<SelectEntry> {
    match target {
        Value::String(path) => Ok(SelectEntry::aliased(alias, path.as_str())),
        Value::Object(map) if map.len() == 1 => {
            let (function, source) = map.iter().next().ok_or_else(malformed_group_select)?;
            let function = AggregateFunction::parse(function).ok_or_else(|| {
                QueryError::invalid_argument(format!(
                    "The given function \"{}\" is not supported in Group By.",
                    function
                ))
            })?;
            let source = source.as_str().ok_or_else(malformed_group_select)?;
            Ok(SelectEntry {
                alias: Some(alias.to_string()),
                field: SelectField::Aggregate {
                    function,
                    source: source.to_string(),
                },
            })
        }
        _ => Err(malformed_group_select()),
    }
}

fn malformed_select() -> QueryError {
    QueryError::invalid_argument(
        "If select is used an array containing strings with fieldNames has to be given",
    )
}

pub(crate) fn malformed_group_select() -> QueryError {
    QueryError::invalid_argument("You need to format the select correctly when using Group By.")
}
