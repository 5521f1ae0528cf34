//! Join resolution

use serde_json::Value;

use crate::document::Document;
use crate::query::{JoinSpec, QueryResult};

/// Attaches joined documents to every result document
pub struct Joiner;

impl Joiner {
    pub fn apply(documents: Vec<Document>, joins: &[JoinSpec]) -> QueryResult<Vec<Document>> {
        if joins.is_empty() {
            return Ok(documents);
        }
        documents
            .into_iter()
            .map(|mut document| -> QueryResult<Document> {
                for join in joins {
                    let joined = join.resolve(&document)?;
                    document.insert(
                        join.property().to_string(),
                        Value::Array(joined.into_iter().map(Value::Object).collect()),
                    );
                }
                Ok(document)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{JoinSource, QueryError};
    use serde_json::json;

    #[test]
    fn test_join_attaches_under_property() {
        let parent = json!({"_id": 1}).as_object().cloned().unwrap();
        let join = JoinSpec::new("children", |doc: &Document| {
            JoinSource::from_value(json!([{"parent": doc["_id"]}]))
        });
        let out = Joiner::apply(vec![parent], &[join]).unwrap();
        assert_eq!(out[0]["children"], json!([{"parent": 1}]));
    }

    #[test]
    fn test_join_error_propagates() {
        let parent = json!({"_id": 1}).as_object().cloned().unwrap();
        let join = JoinSpec::new("x", |_: &Document| JoinSource::from_value(json!(5)));
        let err = Joiner::apply(vec![parent], &[join]).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }
}
