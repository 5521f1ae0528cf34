//! Result sorting
//!
//! All ordering clauses form one stable multi-key sort: the first clause
//! decides, later clauses break ties.

use std::cmp::Ordering;

use serde_json::Value;

use crate::document::{resolve_owned, Document};
use crate::query::{OrderClause, QueryResult, SortDirection};

/// Sorts result documents
pub struct ResultSorter;

impl ResultSorter {
    pub fn sort(documents: Vec<Document>, clauses: &[OrderClause]) -> QueryResult<Vec<Document>> {
        if clauses.is_empty() {
            return Ok(documents);
        }

        // Resolve every sort key once
        let mut keyed = documents
            .into_iter()
            .map(|document| -> QueryResult<(Vec<Value>, Document)> {
                let keys = clauses
                    .iter()
                    .map(|clause| resolve_owned(&document, &clause.field))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((keys, document))
            })
            .collect::<QueryResult<Vec<_>>>()?;

        keyed.sort_by(|(a, _), (b, _)| {
            clauses
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|(clause, (x, y))| {
                    let ordering = Self::compare_values(x, y);
                    match clause.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Ok(keyed.into_iter().map(|(_, document)| document).collect())
    }

    /// Total order over JSON values: null < bool < number < string <
    /// array < object, natural order within a type
    fn compare_values(a: &Value, b: &Value) -> Ordering {
        let type_order = |v: &Value| -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Object(_) => 5,
            }
        };

        let (a_type, b_type) = (type_order(a), type_order(b));
        if a_type != b_type {
            return a_type.cmp(&b_type);
        }

        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                    return xi.cmp(&yi);
                }
                let xf = x.as_f64().unwrap_or(0.0);
                let yf = y.as_f64().unwrap_or(0.0);
                xf.total_cmp(&yf)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()),
            (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
            _ => Ordering::Equal,
        }
    }
}
