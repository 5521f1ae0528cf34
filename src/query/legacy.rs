//! Deprecated nested-where tree
//!
//! Kept for callers that still send `nestedWhere`. The tree is evaluated
//! strictly left to right with no AND/OR precedence, and is combined with
//! the primary condition result through an outer operator. It is parsed
//! and evaluated separately from [`Condition`](super::Condition).

use serde_json::Value;

use super::ast::{Connective, Leaf};
use super::errors::{QueryError, QueryResult};
use super::parser::parse_leaf;

/// Legacy condition tree. Groups are validated when parsed: at least three
/// elements alternating condition / operator.
#[derive(Debug, Clone)]
pub enum LegacyCondition {
    Leaf(Leaf),
    Group {
        first: Box<LegacyCondition>,
        rest: Vec<(Connective, LegacyCondition)>,
    },
}

impl LegacyCondition {
    /// Parses a legacy tree: an array whose first element is a string is a
    /// leaf, any other array is a group.
    pub fn from_json(value: &Value) -> QueryResult<Self> {
        let items = value.as_array().ok_or_else(|| {
            QueryError::invalid_argument(format!(
                "Invalid nested where statement element! Expected condition or operation, got: \"{}\"",
                describe(value)
            ))
        })?;

        if let Some(Value::String(field)) = items.first() {
            if items.len() != 3 {
                return Err(QueryError::invalid_argument(
                    "Where conditions have to be [fieldName, condition, value]",
                ));
            }
            let operator = items[1].as_str().ok_or_else(|| {
                QueryError::invalid_argument(format!(
                    "Condition \"{}\" is not allowed.",
                    describe(&items[1])
                ))
            })?;
            return Ok(LegacyCondition::Leaf(parse_leaf(field, operator, &items[2])?));
        }

        if items.len() < 3 {
            return Err(QueryError::invalid_argument(
                "Malformed nested where statement! A condition consists of at least 3 elements.",
            ));
        }
        if items.len() % 2 == 0 {
            return Err(QueryError::invalid_argument("Malformed nested where statement!"));
        }

        let first = Box::new(Self::from_json(&items[0])?);
        let mut rest = Vec::with_capacity(items.len() / 2);
        for pair in items[1..].chunks(2) {
            let connective = match &pair[0] {
                Value::String(op) => Connective::parse(op)?,
                other => {
                    return Err(QueryError::invalid_argument(format!(
                        "Expected 'and' or 'or' operator got \"{}\"",
                        describe(other)
                    )))
                }
            };
            rest.push((connective, Self::from_json(&pair[1])?));
        }
        Ok(LegacyCondition::Group { first, rest })
    }

    pub fn to_value(&self) -> Value {
        match self {
            LegacyCondition::Leaf(leaf) => leaf.to_value(),
            LegacyCondition::Group { first, rest } => {
                let mut items = vec![first.to_value()];
                for (connective, condition) in rest {
                    items.push(Value::String(connective.as_str().to_string()));
                    items.push(condition.to_value());
                }
                Value::Array(items)
            }
        }
    }
}

/// Legacy tree plus the operator joining it to the primary conditions
#[derive(Debug, Clone)]
pub struct LegacyWhere {
    pub outer: Connective,
    pub condition: LegacyCondition,
}

impl LegacyWhere {
    pub fn new(outer: Connective, condition: LegacyCondition) -> Self {
        Self { outer, condition }
    }

    /// Parses `{"and"|"or": tree}`; a bare tree means `and`.
    /// `null` and empty values mean no legacy filter.
    pub fn from_json(value: &Value) -> QueryResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Array(items) if items.is_empty() => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Array(_) => Ok(Some(Self::new(
                Connective::And,
                LegacyCondition::from_json(value)?,
            ))),
            Value::Object(map) => {
                let (outer, tree) = map.iter().next().ok_or_else(|| {
                    QueryError::invalid_argument("Malformed nested where statement!")
                })?;
                if map.len() != 1 {
                    return Err(QueryError::invalid_argument(
                        "Nested where statement must have exactly one outer operator",
                    ));
                }
                Ok(Some(Self::new(
                    Connective::parse(outer)?,
                    LegacyCondition::from_json(tree)?,
                )))
            }
            other => Err(QueryError::invalid_argument(format!(
                "Invalid nested where statement! Got: \"{}\"",
                describe(other)
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(self.outer.as_str().to_string(), self.condition.to_value());
        Value::Object(map)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
