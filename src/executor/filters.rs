//! Condition evaluation
//!
//! Evaluates a parsed condition tree against one document. Evaluation is
//! pure: the same tree and document always give the same answer and
//! neither is modified.
//!
//! Equality is strict: `1`, `1.0` and `"1"` are three different values.
//! Ordering is loose. Numbers and numeric strings compare by value, null
//! and booleans compare by truthiness, and a missing field orders below
//! any non-empty value. Arrays and objects never satisfy an ordering.

use std::cmp::Ordering;

use serde_json::Value;

use crate::document::{resolve, Document};
use crate::query::{
    parse_datetime, Condition, Connective, GroupItem, Leaf, Operand, Operator, QueryError,
    QueryResult, DATE_TAG,
};

/// Evaluates condition trees against documents
pub struct ConditionEvaluator;

/// A group element after its conditions have been evaluated
#[derive(Clone, Copy)]
enum Slot {
    Result(bool),
    Op(Connective),
}

impl ConditionEvaluator {
    /// Evaluates `condition` against `document`.
    ///
    /// Within a group `and` binds tighter than `or`:
    /// `[A, "and", B, "or", C, "and", D]` is `(A and B) or (C and D)`.
    /// Two adjacent conditions are joined by an implicit `and`.
    pub fn evaluate(condition: &Condition, document: &Document) -> QueryResult<bool> {
        match condition {
            Condition::Leaf(leaf) => Self::evaluate_leaf(leaf, document),
            Condition::Group(items) => {
                let slots = items
                    .iter()
                    .map(|item| match item {
                        GroupItem::Condition(c) => Self::evaluate(c, document).map(Slot::Result),
                        GroupItem::Connective(op) => Ok(Slot::Op(*op)),
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                Self::reduce_group(&slots)
            }
        }
    }

    /// Folds evaluated group elements. AND chains accumulate into a
    /// running value; each `or` parks that value and starts a new chain.
    fn reduce_group(slots: &[Slot]) -> QueryResult<bool> {
        let mut rest = slots.iter();
        let mut running = match rest.next() {
            None => {
                return Err(QueryError::invalid_argument(
                    "Malformed where statement! Where statements can not contain empty arrays.",
                ))
            }
            Some(Slot::Op(_)) => {
                return Err(QueryError::invalid_argument(
                    "Malformed where statement! First part of the statement have to be a condition.",
                ))
            }
            Some(Slot::Result(value)) => *value,
        };
        let mut or_results = Vec::new();

        while let Some(slot) = rest.next() {
            let (op, next) = match slot {
                Slot::Result(value) => (Connective::And, *value),
                Slot::Op(op) => match rest.next() {
                    None => {
                        return Err(QueryError::invalid_argument(
                            "Malformed where statement! Last part of a condition can not be a operation.",
                        ))
                    }
                    Some(Slot::Op(_)) => {
                        return Err(QueryError::invalid_argument(
                            "Malformed where statement! Two operations in a row are not allowed.",
                        ))
                    }
                    Some(Slot::Result(value)) => (*op, *value),
                },
            };
            match op {
                Connective::Or => {
                    or_results.push(running);
                    running = next;
                }
                Connective::And => running = running && next,
            }
        }

        Ok(running || or_results.into_iter().any(|value| value))
    }

    /// Evaluates a single comparison. A missing field compares as `null`.
    pub fn evaluate_leaf(leaf: &Leaf, document: &Document) -> QueryResult<bool> {
        let field = resolve(document, leaf.field())?.unwrap_or(&Value::Null);
        Self::compare(leaf, field)
    }

    fn compare(leaf: &Leaf, field: &Value) -> QueryResult<bool> {
        let operator = leaf.operator();
        match operator {
            Operator::Like | Operator::NotLike => {
                let matched = match (leaf.pattern(), like_subject(field)) {
                    (Some(pattern), Some(subject)) => pattern.is_match(&subject),
                    _ => false,
                };
                Ok(matched == (operator == Operator::Like))
            }
            Operator::In | Operator::NotIn => {
                let items = match leaf.operand() {
                    Operand::List(items) => items,
                    _ => return Ok(false),
                };
                let found = match items.first() {
                    Some(Operand::DateTime(_)) => {
                        if is_empty(field) {
                            return Ok(false);
                        }
                        let stamp = stored_timestamp(field)?;
                        items.iter().any(|item| match item {
                            Operand::DateTime(dt) => dt.timestamp() == stamp,
                            _ => false,
                        })
                    }
                    _ => items.iter().any(|item| item.to_value() == *field),
                };
                Ok(found == (operator == Operator::In))
            }
            Operator::Between | Operator::NotBetween => {
                let (lower, upper) = match leaf.operand() {
                    Operand::List(bounds) if bounds.len() == 2 => (&bounds[0], &bounds[1]),
                    _ => return Ok(false),
                };
                let inside = Self::compare_scalar(Operator::Gte, field, lower)?
                    && Self::compare_scalar(Operator::Lte, field, upper)?;
                Ok(inside == (operator == Operator::Between))
            }
            _ => Self::compare_scalar(operator, field, leaf.operand()),
        }
    }

    /// `=`, `!=` and the four orderings against one operand
    fn compare_scalar(operator: Operator, field: &Value, operand: &Operand) -> QueryResult<bool> {
        let ordering = match operand {
            Operand::DateTime(dt) => {
                // An empty stored value never matches a date
                if is_empty(field) {
                    return Ok(false);
                }
                Some(stored_timestamp(field)?.cmp(&dt.timestamp()))
            }
            Operand::Value(expected) => match operator {
                Operator::Eq => return Ok(field == expected),
                Operator::NotEq => return Ok(field != expected),
                _ => compare_values(field, expected),
            },
            Operand::List(_) => return Ok(false),
        };

        let Some(ordering) = ordering else {
            return Ok(false);
        };
        Ok(match operator {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::NotEq => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            _ => false,
        })
    }
}

/// Loose ordering of two scalars; `None` when either side is an array or
/// an object.
///
/// - null against a string orders like `""`
/// - otherwise null or a boolean on either side compares truthiness
/// - numbers order numerically against numbers and numeric strings
/// - a number against any other string compares its decimal text
/// - two strings compare numerically only when both are numeric
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => None,
        (Value::Null, Value::String(s)) => Some(empty_text_order(s)),
        (Value::String(s), Value::Null) => Some(empty_text_order(s).reverse()),
        (Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
            Some((!is_empty(a)).cmp(&!is_empty(b)))
        }
        (Value::Number(x), Value::Number(y)) => {
            Numeric::from_number(x)?.compare(Numeric::from_number(y)?)
        }
        (Value::Number(x), Value::String(y)) => match Numeric::parse(y) {
            Some(y) => Numeric::from_number(x)?.compare(y),
            None => Some(x.to_string().as_str().cmp(y.as_str())),
        },
        (Value::String(x), Value::Number(y)) => match Numeric::parse(x) {
            Some(x) => x.compare(Numeric::from_number(y)?),
            None => Some(x.as_str().cmp(y.to_string().as_str())),
        },
        (Value::String(x), Value::String(y)) => match (Numeric::parse(x), Numeric::parse(y)) {
            (Some(x), Some(y)) => x.compare(y),
            _ => Some(x.cmp(y)),
        },
    }
}

/// How `""` orders against `text`
fn empty_text_order(text: &str) -> Ordering {
    if text.is_empty() {
        Ordering::Equal
    } else {
        Ordering::Less
    }
}

/// A number or numeric string ready for comparison
#[derive(Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn from_number(n: &serde_json::Number) -> Option<Self> {
        match n.as_i64() {
            Some(i) => Some(Numeric::Int(i)),
            None => n.as_f64().map(Numeric::Float),
        }
    }

    /// Decimal or exponent notation, surrounding whitespace allowed.
    /// `inf` and `nan` spellings are not numeric.
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.bytes().any(|b| b.is_ascii_digit())
            || text.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
        {
            return None;
        }
        if let Ok(i) = text.parse::<i64>() {
            return Some(Numeric::Int(i));
        }
        text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Numeric::Float)
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    fn compare(self, other: Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(x), Numeric::Int(y)) => Some(x.cmp(&y)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

/// Text a `like` pattern is matched against
fn like_subject(field: &Value) -> Option<String> {
    match field {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) | Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Values treated as "no value": null, false, zero, "", "0" and empty
/// containers
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Converts a stored value to a UNIX timestamp for date comparison
fn stored_timestamp(value: &Value) -> QueryResult<i64> {
    let converted = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_datetime(s).map(|dt| dt.timestamp()),
        Value::Object(map) => map
            .get(DATE_TAG)
            .and_then(Value::as_str)
            .and_then(parse_datetime)
            .map(|dt| dt.timestamp()),
        _ => None,
    };
    converted.ok_or_else(|| {
        QueryError::invalid_argument(format!(
            "Can not convert \"{}\" to a timestamp",
            value
        ))
    })
}
