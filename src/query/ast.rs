//! Condition tree structures
//!
//! A condition is either a leaf comparison `[field, operator, value]` or a
//! group of conditions joined by `and` / `or`. Raw JSON is parsed into this
//! shape once; evaluation never looks at the raw form again.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};

use super::errors::{QueryError, QueryResult};

/// Binary operator between conditions of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Parses `and` / `or`, case-insensitively
    pub fn parse(raw: &str) -> QueryResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "and" => Ok(Connective::And),
            "or" => Ok(Connective::Or),
            _ => Err(QueryError::invalid_argument(format!(
                "Expected 'and' or 'or' operator got \"{}\"",
                raw
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }
}

/// Comparison operator of a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
}

impl Operator {
    /// Parses an operator, trimmed and case-insensitive
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let op = match raw.trim().to_lowercase().as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "between" => Operator::Between,
            "not between" => Operator::NotBetween,
            _ => {
                return Err(QueryError::invalid_argument(format!(
                    "Condition \"{}\" is not allowed.",
                    raw
                )))
            }
        };
        Ok(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
        }
    }

    /// Operators whose comparison value is a list
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            Operator::In | Operator::NotIn | Operator::Between | Operator::NotBetween
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Plain JSON value
    Value(Value),
    /// Date/time: both sides are compared as UNIX timestamps
    DateTime(DateTime<FixedOffset>),
    /// Value list for `in` and `between`
    List(Vec<Operand>),
}

impl Operand {
    pub fn is_datetime(&self) -> bool {
        matches!(self, Operand::DateTime(_))
    }

    /// JSON form, with date/times encoded as `{"$date": "<rfc3339>"}`
    pub fn to_value(&self) -> Value {
        match self {
            Operand::Value(v) => v.clone(),
            Operand::DateTime(dt) => json!({ "$date": dt.to_rfc3339() }),
            Operand::List(items) => Value::Array(items.iter().map(Operand::to_value).collect()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Operand::Value(Value::Array(_)) => "array".to_string(),
            Operand::Value(Value::Object(_)) => "object".to_string(),
            Operand::Value(Value::Null) => "NULL".to_string(),
            Operand::Value(v) => v.to_string(),
            Operand::DateTime(dt) => dt.to_rfc3339(),
            Operand::List(_) => "array".to_string(),
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<DateTime<FixedOffset>> for Operand {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Operand::DateTime(value)
    }
}

/// Parses the date/time formats accepted for comparison values and stored
/// fields: RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` (both UTC).
pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Characters escaped before a `like` pattern becomes a regex. `[`, `]`,
/// `^` and `-` stay live so character classes keep working.
const LIKE_ESCAPED: &[char] = &[
    '.', '\\', '+', '*', '?', '$', '(', ')', '{', '}', '|', '#', '&', '~',
];

/// SQL-style wildcard pattern: `%` is any run, `_` exactly one character.
/// Matching is anchored and case-insensitive.
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: Regex,
}

impl LikePattern {
    pub fn compile(pattern: &str) -> QueryResult<Self> {
        let mut translated = String::with_capacity(pattern.len() + 8);
        translated.push('^');
        for c in pattern.chars() {
            match c {
                '%' => translated.push_str(".*"),
                '_' => translated.push('.'),
                c if LIKE_ESCAPED.contains(&c) => {
                    translated.push('\\');
                    translated.push(c);
                }
                c => translated.push(c),
            }
        }
        translated.push('$');

        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                QueryError::invalid_argument(format!("Invalid LIKE pattern \"{}\": {}", pattern, e))
            })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// A single comparison `[field, operator, value]`
#[derive(Debug, Clone)]
pub struct Leaf {
    field: String,
    operator: Operator,
    operand: Operand,
    pattern: Option<LikePattern>,
}

impl Leaf {
    /// Builds a leaf, checking that the operand has the shape the operator
    /// needs. `like` patterns are compiled here.
    pub fn new(field: impl Into<String>, operator: &str, operand: Operand) -> QueryResult<Self> {
        let field = field.into().trim().to_string();
        if field.is_empty() {
            return Err(QueryError::invalid_argument(
                "fieldName is not allowed to be empty",
            ));
        }
        let operator = Operator::parse(operator)?;

        let pattern = match operator {
            Operator::Like | Operator::NotLike => match &operand {
                Operand::Value(Value::String(p)) => Some(LikePattern::compile(p)?),
                _ => {
                    return Err(QueryError::invalid_argument(
                        "When using \"LIKE\" or \"NOT LIKE\" the value has to be a string.",
                    ))
                }
            },
            _ => None,
        };

        match operator {
            Operator::In | Operator::NotIn => Self::check_membership_list(&operand)?,
            Operator::Between | Operator::NotBetween => Self::check_bounds(&operand)?,
            _ => {
                if matches!(operand, Operand::List(_)) {
                    return Err(QueryError::invalid_argument(format!(
                        "Operator \"{}\" does not take a list of values",
                        operator
                    )));
                }
            }
        }

        Ok(Self {
            field,
            operator,
            operand,
            pattern,
        })
    }

    fn check_membership_list(operand: &Operand) -> QueryResult<()> {
        let items = match operand {
            Operand::List(items) => items,
            other => {
                return Err(QueryError::invalid_argument(format!(
                    "When using \"in\" and \"not in\" you have to check against an array. Got: {}",
                    other.describe()
                )))
            }
        };
        for item in items {
            if matches!(
                item,
                Operand::List(_) | Operand::Value(Value::Array(_)) | Operand::Value(Value::Object(_))
            ) {
                return Err(QueryError::invalid_argument(
                    "When using \"in\" and \"not in\" the array may not contain arrays or objects.",
                ));
            }
        }
        let dates = items.iter().filter(|item| item.is_datetime()).count();
        if dates > 0 && dates != items.len() {
            return Err(QueryError::invalid_argument(
                "If one DateTime object is given in an \"IN\" or \"NOT IN\" comparison, every element has to be a DateTime object!",
            ));
        }
        Ok(())
    }

    fn check_bounds(operand: &Operand) -> QueryResult<()> {
        match operand {
            Operand::List(items) if items.len() == 2 => {
                if items.iter().any(|b| matches!(b, Operand::List(_))) {
                    return Err(QueryError::invalid_argument(
                        "Bounds of \"between\" may not be lists.",
                    ));
                }
                Ok(())
            }
            Operand::List(items) => Err(QueryError::invalid_argument(format!(
                "When using \"between\" you have to check against an array with a length of 2. Got: array | Length: {}",
                items.len()
            ))),
            other => Err(QueryError::invalid_argument(format!(
                "When using \"between\" you have to check against an array with a length of 2. Got: {}",
                other.describe()
            ))),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Compiled pattern for `like` / `not like`
    pub fn pattern(&self) -> Option<&LikePattern> {
        self.pattern.as_ref()
    }

    pub fn to_value(&self) -> Value {
        json!([self.field, self.operator.as_str(), self.operand.to_value()])
    }
}

/// One element of a group: a nested condition or an operator
#[derive(Debug, Clone)]
pub enum GroupItem {
    Condition(Condition),
    Connective(Connective),
}

impl GroupItem {
    pub fn and() -> Self {
        GroupItem::Connective(Connective::And)
    }

    pub fn or() -> Self {
        GroupItem::Connective(Connective::Or)
    }
}

impl From<Condition> for GroupItem {
    fn from(condition: Condition) -> Self {
        GroupItem::Condition(condition)
    }
}

/// Boolean expression tree evaluated against one document.
///
/// Groups are stored as written; whether operators and conditions
/// alternate correctly is checked when the group is evaluated.
#[derive(Debug, Clone)]
pub enum Condition {
    Leaf(Leaf),
    Group(Vec<GroupItem>),
}

impl Condition {
    /// Shorthand for a leaf condition
    pub fn leaf(field: impl Into<String>, operator: &str, operand: impl Into<Operand>) -> QueryResult<Self> {
        Ok(Condition::Leaf(Leaf::new(field, operator, operand.into())?))
    }

    pub fn group(items: Vec<GroupItem>) -> Self {
        Condition::Group(items)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Condition::Leaf(leaf) => leaf.to_value(),
            Condition::Group(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        GroupItem::Condition(c) => c.to_value(),
                        GroupItem::Connective(op) => Value::String(op.as_str().to_string()),
                    })
                    .collect(),
            ),
        }
    }
}
