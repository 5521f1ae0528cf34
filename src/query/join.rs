//! Join descriptors
//!
//! A join attaches related documents to every result document. The
//! callback either returns the documents directly or hands back something
//! that can fetch them, typically another [`Query`](crate::executor::Query).

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use crate::document::Document;

/// Anything that can produce a sequence of documents on demand
pub trait DeferredFetch {
    fn fetch(&self) -> QueryResult<Vec<Document>>;
}

/// What a join callback hands back
pub enum JoinSource {
    /// Documents already in hand
    Materialized(Vec<Document>),
    /// Documents fetched when the join is resolved
    Deferred(Box<dyn DeferredFetch>),
}

impl JoinSource {
    pub fn deferred(source: impl DeferredFetch + 'static) -> Self {
        JoinSource::Deferred(Box::new(source))
    }

    /// Accepts an array of objects; anything else is an invalid join.
    pub fn from_value(value: Value) -> QueryResult<Self> {
        let items = match value {
            Value::Array(items) => items,
            _ => return Err(invalid_join()),
        };
        let documents = items
            .into_iter()
            .map(|item| match item {
                Value::Object(document) => Ok(document),
                _ => Err(invalid_join()),
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(JoinSource::Materialized(documents))
    }

    /// Resolves to the joined documents
    pub fn resolve(self) -> QueryResult<Vec<Document>> {
        match self {
            JoinSource::Materialized(documents) => Ok(documents),
            JoinSource::Deferred(source) => source.fetch(),
        }
    }
}

impl fmt::Debug for JoinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSource::Materialized(documents) => {
                f.debug_tuple("Materialized").field(&documents.len()).finish()
            }
            JoinSource::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

fn invalid_join() -> QueryError {
    QueryError::invalid_argument("Invalid join query.")
}

type JoinCallback = dyn Fn(&Document) -> QueryResult<JoinSource> + Send + Sync;

/// Join callback plus the property the joined documents land under
#[derive(Clone)]
pub struct JoinSpec {
    property: String,
    callback: Arc<JoinCallback>,
}

impl JoinSpec {
    pub fn new<F>(property: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Document) -> QueryResult<JoinSource> + Send + Sync + 'static,
    {
        Self {
            property: property.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    /// Runs the callback for one document and resolves its result
    pub fn resolve(&self, document: &Document) -> QueryResult<Vec<Document>> {
        (self.callback)(document)?.resolve()
    }
}

impl fmt::Debug for JoinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinSpec")
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Vec<Document>);

    impl DeferredFetch for Fixed {
        fn fetch(&self) -> QueryResult<Vec<Document>> {
            Ok(self.0.clone())
        }
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_from_value_accepts_array_of_objects() {
        let source = JoinSource::from_value(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(source.resolve().unwrap().len(), 2);
    }

    #[test]
    fn test_from_value_rejects_other_shapes() {
        assert!(JoinSource::from_value(json!("nope")).is_err());
        assert!(JoinSource::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_deferred_source_fetches() {
        let source = JoinSource::deferred(Fixed(vec![doc(json!({"x": 1}))]));
        assert_eq!(source.resolve().unwrap(), vec![doc(json!({"x": 1}))]);
    }

    #[test]
    fn test_spec_passes_document_to_callback() {
        let spec = JoinSpec::new("echo", |document: &Document| {
            Ok(JoinSource::Materialized(vec![document.clone()]))
        });
        let parent = doc(json!({"_id": 7}));
        assert_eq!(spec.resolve(&parent).unwrap(), vec![parent.clone()]);
        assert_eq!(spec.property(), "echo");
    }
}
