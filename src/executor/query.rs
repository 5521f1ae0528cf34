//! Public query surface
//!
//! A [`Query`] binds one [`QueryConfig`] to a [`Store`]. Reads go through
//! the cache gateway, the scanner and the result pipeline; mutations go
//! through [`MutationExecutor`].

use serde_json::Value;

use crate::cache::CacheKey;
use crate::document::Document;
use crate::observability::{log_event_with_fields, Event};
use crate::query::{CacheSettings, DeferredFetch, QueryConfig, QueryResult};
use crate::store::Store;

use super::gateway::CacheGateway;
use super::mutation::MutationExecutor;
use super::pipeline::ResultPipeline;
use super::result::{documents_to_value, DeleteOutcome, DeleteReturn, UpdateOutcome};
use super::scanner::DocumentScanner;

const ONE_DOCUMENT: &str = "oneDocument";

/// A configured query against one store
#[derive(Debug, Clone)]
pub struct Query {
    store: Store,
    config: QueryConfig,
}

impl Query {
    pub fn new(store: Store, config: QueryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn cache_key(&self, one_document: bool) -> CacheKey {
        self.config
            .cache_token()
            .with(ONE_DOCUMENT, Value::Bool(one_document))
            .key()
    }

    /// Join callbacks are opaque to the cache key, so a configuration
    /// with joins never reads or writes the cache.
    fn cache_settings(&self) -> CacheSettings {
        let mut settings = self.config.cache;
        if !self.config.joins.is_empty() {
            settings.use_cache = false;
        }
        settings
    }

    fn gateway(&self) -> CacheGateway<'_> {
        CacheGateway::new(self.store.cache(), self.store.metrics())
    }

    /// Scan plus result pipeline, bypassing the cache
    fn execute(&self, first_only: bool) -> QueryResult<Vec<Document>> {
        let documents = DocumentScanner::new(
            self.store.storage(),
            self.store.data_path(),
            self.store.metrics(),
        )
        .scan(&self.config, first_only)?;
        ResultPipeline::new(&self.config, self.store.primary_key()).run(documents)
    }

    fn begin(&self, operation: &str) {
        self.store.metrics().increment_queries_executed();
        log_event_with_fields(Event::QueryBegin, &[("operation", operation)]);
    }

    fn complete(&self, operation: &str, source: &str, results: usize) {
        log_event_with_fields(
            Event::QueryComplete,
            &[
                ("operation", operation),
                ("source", source),
                ("results", &results.to_string()),
            ],
        );
    }

    /// Every matching document after the result pipeline
    pub fn fetch(&self) -> QueryResult<Vec<Document>> {
        self.begin("fetch");
        let settings = self.cache_settings();
        let key = self.cache_key(false);
        let gateway = self.gateway();

        if let Some(Value::Array(items)) = gateway.lookup(&settings, &key)? {
            if let Some(documents) = decode_documents(items) {
                self.complete("fetch", "cache", documents.len());
                return Ok(documents);
            }
        }

        let documents = self.execute(false)?;
        gateway.store(&settings, &key, &documents_to_value(&documents))?;
        self.complete("fetch", "scan", documents.len());
        Ok(documents)
    }

    /// The first matching document; the scan stops at the first match.
    /// `None` when nothing matches.
    pub fn first(&self) -> QueryResult<Option<Document>> {
        self.begin("first");
        let settings = self.cache_settings();
        let key = self.cache_key(true);
        let gateway = self.gateway();

        match gateway.lookup(&settings, &key)? {
            Some(Value::Object(document)) => {
                self.complete("first", "cache", 1);
                return Ok(Some(document));
            }
            Some(Value::Array(items)) if items.is_empty() => {
                self.complete("first", "cache", 0);
                return Ok(None);
            }
            _ => {}
        }

        let document = self.execute(true)?.into_iter().next();
        let content = match &document {
            Some(document) => Value::Object(document.clone()),
            None => Value::Array(Vec::new()),
        };
        gateway.store(&settings, &key, &content)?;
        self.complete("first", "scan", usize::from(document.is_some()));
        Ok(document)
    }

    /// Whether at least one document matches
    pub fn exists(&self) -> QueryResult<bool> {
        Ok(self
            .first()?
            .map_or(false, |document| !document.is_empty()))
    }

    /// Writes `updates` (dot-path → value) into every matching document
    pub fn update(&self, updates: &Document, return_documents: bool) -> QueryResult<UpdateOutcome> {
        MutationExecutor::new(&self.store).update(&self.config, updates, return_documents)
    }

    /// Deletes every matching document
    pub fn delete(&self, return_option: DeleteReturn) -> QueryResult<DeleteOutcome> {
        MutationExecutor::new(&self.store).delete(&self.config, return_option)
    }
}

impl DeferredFetch for Query {
    fn fetch(&self) -> QueryResult<Vec<Document>> {
        Query::fetch(self)
    }
}

/// A cached result that is not an array of objects reads as a miss
fn decode_documents(items: Vec<Value>) -> Option<Vec<Document>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(document) => Some(document),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, JoinSource, OrderClause};
    use crate::store::StoreConfig;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir, name: &str) -> Store {
        Store::open(StoreConfig::new(dir.path().join(name))).unwrap()
    }

    fn put(store: &Store, doc: Value) {
        let stem = doc["_id"].to_string();
        fs::write(store.document_path(&stem), doc.to_string()).unwrap();
    }

    fn values(documents: Vec<Document>) -> Vec<Value> {
        documents.into_iter().map(Value::Object).collect()
    }

    #[test]
    fn test_fetch_range() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "users");
        put(&store, json!({"_id": 1, "age": 20}));
        put(&store, json!({"_id": 2, "age": 30}));
        put(&store, json!({"_id": 3, "age": 40}));

        let config = QueryConfig::new().with_conditions(Condition::group(vec![
            Condition::leaf("age", ">=", json!(25)).unwrap().into(),
            crate::query::GroupItem::and(),
            Condition::leaf("age", "<", json!(40)).unwrap().into(),
        ]));
        let result = store.query(config).fetch().unwrap();
        assert_eq!(values(result), vec![json!({"_id": 2, "age": 30})]);
        assert_eq!(store.metrics().queries_executed(), 1);
    }

    #[test]
    fn test_first_and_exists_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "users");
        let query = store.query(store.query_config());
        assert_eq!(query.first().unwrap(), None);
        assert!(!query.exists().unwrap());
    }

    #[test]
    fn test_first_stops_at_first_match() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "users");
        put(&store, json!({"_id": 1, "age": 20}));
        put(&store, json!({"_id": 2, "age": 30}));

        let query = store.query(QueryConfig::new().with_order(OrderClause::desc("age")));
        assert_eq!(query.first().unwrap().unwrap()["_id"], json!(1));
        assert!(query.exists().unwrap());
    }

    #[test]
    fn test_cached_fetch_survives_external_write_until_mutation() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "users");
        put(&store, json!({"_id": 1}));

        let query = store.query(store.query_config());
        assert_eq!(query.fetch().unwrap().len(), 1);

        put(&store, json!({"_id": 2}));
        assert_eq!(query.fetch().unwrap().len(), 1);
        assert_eq!(store.metrics().snapshot().cache_hits, 1);

        query.delete(DeleteReturn::Bool).unwrap();
        assert!(query.fetch().unwrap().is_empty());
    }

    #[test]
    fn test_join_with_deferred_query() {
        let dir = TempDir::new().unwrap();
        let users = open_store(&dir, "users");
        let posts = open_store(&dir, "posts");
        put(&users, json!({"_id": 1, "name": "ada"}));
        put(&posts, json!({"_id": 10, "author": 1}));
        put(&posts, json!({"_id": 11, "author": 2}));

        let posts_handle = posts.clone();
        let config = QueryConfig::new().with_join("posts", move |user: &Document| {
            let author = user.get("_id").cloned().unwrap_or(Value::Null);
            let condition = Condition::leaf("author", "=", author)?;
            let query = posts_handle.query(QueryConfig::new().with_conditions(condition));
            Ok(JoinSource::deferred(query))
        });

        let result = users.query(config).fetch().unwrap();
        assert_eq!(
            values(result),
            vec![json!({"_id": 1, "name": "ada", "posts": [{"_id": 10, "author": 1}]})]
        );
    }

    #[test]
    fn test_joined_queries_skip_the_cache() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "users");
        put(&store, json!({"_id": 1}));

        let tagged = |tag: &'static str| {
            store.query_config().with_join("extra", move |_: &Document| {
                Ok(JoinSource::Materialized(vec![json!({"tag": tag})
                    .as_object()
                    .cloned()
                    .unwrap()]))
            })
        };

        let first = store.query(tagged("a")).fetch().unwrap();
        let second = store.query(tagged("b")).fetch().unwrap();
        assert_eq!(first[0]["extra"], json!([{"tag": "a"}]));
        assert_eq!(second[0]["extra"], json!([{"tag": "b"}]));

        let snapshot = store.metrics().snapshot();
        assert_eq!(snapshot.cache_hits, 0);
        assert_eq!(snapshot.cache_misses, 0);
        assert!(fs::read_dir(store.config().cache_path())
            .map_or(true, |mut entries| entries.next().is_none()));
    }
}
