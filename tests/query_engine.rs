//! Query engine tests
//!
//! End-to-end reads against real stores on disk:
//! - condition trees and operator semantics
//! - group by, projection, search, distinct, legacy nested where
//! - tolerance of unreadable documents

use flatdoc::query::{QueryConfig, QueryResult};
use flatdoc::store::{Store, StoreConfig};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_store(docs: Vec<Value>) -> (TempDir, Store) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Store::open(StoreConfig::new(temp_dir.path().join("store"))).unwrap();
    for doc in docs {
        let stem = match &doc["_id"] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        fs::write(store.document_path(&stem), doc.to_string()).unwrap();
    }
    (temp_dir, store)
}

/// Query configuration from property overrides, cache off
fn config(overrides: Value) -> QueryResult<QueryConfig> {
    let overrides = overrides.as_object().cloned().unwrap_or_default();
    let props = QueryConfig::merge_properties(QueryConfig::default_properties(), &overrides)?;
    QueryConfig::from_properties(&props)
}

fn fetch(store: &Store, overrides: Value) -> QueryResult<Vec<Value>> {
    let documents = store.query(config(overrides)?).fetch()?;
    Ok(documents.into_iter().map(Value::Object).collect())
}

fn ids(results: &[Value]) -> Vec<Value> {
    results.iter().map(|doc| doc["_id"].clone()).collect()
}

fn people() -> Vec<Value> {
    vec![
        json!({"_id": 1, "age": 20}),
        json!({"_id": 2, "age": 30}),
        json!({"_id": 3, "age": 40}),
    ]
}

// =============================================================================
// Conditions
// =============================================================================

#[test]
fn test_range_query_returns_exact_match() {
    let (_dir, store) = create_store(people());
    let results = fetch(
        &store,
        json!({"conditions": [["age", ">=", 25], "and", ["age", "<", 40]]}),
    )
    .unwrap();
    assert_eq!(results, vec![json!({"_id": 2, "age": 30})]);
}

#[test]
fn test_and_binds_tighter_than_or() {
    let (_dir, store) = create_store(people());

    // (age = 20 AND age = 30) OR (age = 40) -> only 3
    let results = fetch(
        &store,
        json!({"conditions": [
            ["age", "=", 20], "and", ["age", "=", 30], "or", ["age", "=", 40]
        ]}),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(3)]);
}

#[test]
fn test_implicit_and_between_adjacent_conditions() {
    let (_dir, store) = create_store(people());
    let results = fetch(
        &store,
        json!({"conditions": [["age", ">", 20], ["age", "<", 40]]}),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);
}

#[test]
fn test_equality_is_type_strict() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "code": "7"}),
        json!({"_id": 2, "code": 7}),
    ]);
    let results = fetch(&store, json!({"conditions": ["code", "=", 7]})).unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);
}

#[test]
fn test_ordering_is_loose_across_types() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1}),
        json!({"_id": 2, "age": "30"}),
        json!({"_id": 3, "age": 50}),
    ]);

    let results = fetch(&store, json!({"conditions": ["age", "<", 40]})).unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(2)]);

    let results = fetch(&store, json!({"conditions": ["age", ">", "4"]})).unwrap();
    assert_eq!(ids(&results), vec![json!(2), json!(3)]);
}

#[test]
fn test_like_wildcards() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "word": "testx"}),
        json!({"_id": 2, "word": "teaaaatx"}),
        json!({"_id": 3, "word": "test"}),
        json!({"_id": 4, "word": "TESTY"}),
    ]);
    let results = fetch(&store, json!({"conditions": ["word", "like", "te%t_"]})).unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(2), json!(4)]);

    let results = fetch(&store, json!({"conditions": ["word", "not like", "te%t_"]})).unwrap();
    assert_eq!(ids(&results), vec![json!(3)]);
}

#[test]
fn test_between_and_not_between_partition() {
    let (_dir, store) = create_store(people());
    let inside = fetch(&store, json!({"conditions": ["age", "between", [20, 30]]})).unwrap();
    let outside = fetch(&store, json!({"conditions": ["age", "not between", [20, 30]]})).unwrap();
    assert_eq!(ids(&inside), vec![json!(1), json!(2)]);
    assert_eq!(ids(&outside), vec![json!(3)]);
}

#[test]
fn test_in_and_not_in() {
    let (_dir, store) = create_store(people());
    let results = fetch(&store, json!({"conditions": ["age", "in", [20, 40, "30"]]})).unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(3)]);

    let results = fetch(&store, json!({"conditions": ["age", "not in", [20, 40]]})).unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);
}

#[test]
fn test_in_with_mixed_dates_is_invalid() {
    let (_dir, store) = create_store(people());
    let err = fetch(
        &store,
        json!({"conditions": ["born", "in", [{"$date": "2024-01-01"}, "2024-01-02"]]}),
    )
    .unwrap_err();
    assert_eq!(err.code(), "FLATDOC_INVALID_ARGUMENT");
}

#[test]
fn test_date_comparison_and_empty_field() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "joined": "2023-06-01"}),
        json!({"_id": 2, "joined": "2024-03-15 10:00:00"}),
        json!({"_id": 3, "joined": ""}),
        json!({"_id": 4}),
    ]);
    let results = fetch(
        &store,
        json!({"conditions": ["joined", ">", {"$date": "2024-01-01"}]}),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);

    // An empty stored value never matches a date, not even with "<"
    let results = fetch(
        &store,
        json!({"conditions": ["joined", "<", {"$date": "2024-01-01"}]}),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(1)]);
}

#[test]
fn test_unsupported_operator_is_invalid() {
    let (_dir, store) = create_store(people());
    let err = fetch(&store, json!({"conditions": ["age", "~=", 1]})).unwrap_err();
    assert_eq!(err.code(), "FLATDOC_INVALID_ARGUMENT");
}

#[test]
fn test_nested_field_paths() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "address": {"city": "Rome"}}),
        json!({"_id": 2, "address": {"city": "Oslo"}}),
    ]);
    let results = fetch(&store, json!({"conditions": ["address.city", "=", "Oslo"]})).unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);
}

// =============================================================================
// Scan
// =============================================================================

#[test]
fn test_unreadable_document_is_skipped() {
    let (_dir, store) = create_store(people());
    fs::write(store.document_path("4"), "{broken").unwrap();
    fs::write(store.data_path().join("notes.txt"), "not a document").unwrap();

    let results = fetch(&store, json!({})).unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(2), json!(3)]);
    assert_eq!(store.metrics().snapshot().documents_skipped, 1);
}

#[test]
fn test_distinct_rejects_repeated_values() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "city": "Rome"}),
        json!({"_id": 2, "city": "Rome"}),
        json!({"_id": 3, "city": "Oslo"}),
    ]);
    let results = fetch(&store, json!({"distinctFields": ["city"]})).unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(3)]);
}

#[test]
fn test_legacy_nested_where() {
    let (_dir, store) = create_store(people());

    let results = fetch(
        &store,
        json!({
            "conditions": ["age", ">", 20],
            "nestedWhere": {"and": [["age", "=", 30], "or", ["age", "=", 20]]}
        }),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);

    // "or" keeps everything the primary tree already matched
    let results = fetch(
        &store,
        json!({
            "conditions": ["age", ">", 30],
            "nestedWhere": {"or": ["age", "=", 20]}
        }),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(3)]);
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn test_order_skip_limit() {
    let (_dir, store) = create_store(people());
    let results = fetch(
        &store,
        json!({
            "orderBy": [{"field": "age", "direction": "desc"}],
            "skip": 1,
            "limit": 1
        }),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(2)]);
}

#[test]
fn test_group_by_with_count_key() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "dept": "x"}),
        json!({"_id": 2, "dept": "x"}),
        json!({"_id": 3, "dept": "y"}),
    ]);
    let results = fetch(
        &store,
        json!({"groupBy": {"groupByFields": ["dept"], "countKeyName": "n", "allowEmpty": false}}),
    )
    .unwrap();
    assert_eq!(
        results,
        vec![json!({"dept": "x", "n": 2}), json!({"dept": "y", "n": 1})]
    );
}

#[test]
fn test_group_by_avg_counts_nulls() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "dept": "x", "v": 10}),
        json!({"_id": 2, "dept": "x", "v": null}),
        json!({"_id": 3, "dept": "x", "v": 20}),
        json!({"_id": 4, "v": 99}),
    ]);
    let results = fetch(
        &store,
        json!({
            "groupBy": {"groupByFields": ["dept"], "countKeyName": null, "allowEmpty": false},
            "fieldsToSelect": ["dept", {"avgV": {"avg": "v"}}]
        }),
    )
    .unwrap();
    assert_eq!(results, vec![json!({"dept": "x", "avgV": 10})]);
}

#[test]
fn test_group_by_rejects_ungrouped_select() {
    let (_dir, store) = create_store(people());
    let err = fetch(
        &store,
        json!({
            "groupBy": {"groupByFields": ["age"], "countKeyName": null, "allowEmpty": false},
            "fieldsToSelect": ["name"]
        }),
    )
    .unwrap_err();
    assert_eq!(err.code(), "FLATDOC_INVALID_ARGUMENT");
}

#[test]
fn test_select_keeps_primary_key_and_nests_paths() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "a": {"b": 5, "c": 6}, "name": "ada"}),
    ]);
    let results = fetch(&store, json!({"fieldsToSelect": ["a.b", {"who": "name"}]})).unwrap();
    assert_eq!(results, vec![json!({"_id": 1, "a": {"b": 5}, "who": "ada"})]);
    assert_eq!(results[0]["a"]["b"], json!(5));
}

#[test]
fn test_exclude_removes_leaf_only() {
    let (_dir, store) = create_store(vec![json!({"_id": 1, "a": {"b": 5, "c": 6}})]);
    let results = fetch(&store, json!({"fieldsToExclude": ["a.b", "_id"]})).unwrap();
    assert_eq!(results, vec![json!({"_id": 1, "a": {"c": 6}})]);
}

#[test]
fn test_search_ranks_and_filters() {
    let (_dir, store) = create_store(vec![
        json!({"_id": 1, "title": "database"}),
        json!({"_id": 2, "title": "unrelated words entirely"}),
        json!({"_id": 3, "title": "databases"}),
    ]);
    let results = fetch(
        &store,
        json!({"search": {"keyword": "database", "fields": ["title"]}}),
    )
    .unwrap();
    assert_eq!(ids(&results), vec![json!(1), json!(3)]);
}

#[test]
fn test_first_and_exists() {
    let (_dir, store) = create_store(people());
    let query = store.query(config(json!({"conditions": ["age", ">", 25]})).unwrap());
    assert_eq!(query.first().unwrap().unwrap()["_id"], json!(2));
    assert!(query.exists().unwrap());

    let none = store.query(config(json!({"conditions": ["age", ">", 99]})).unwrap());
    assert_eq!(none.first().unwrap(), None);
    assert!(!none.exists().unwrap());
}

#[test]
fn test_missing_property_is_invalid_access() {
    let mut props = QueryConfig::default_properties();
    props.remove("skip");
    let err = QueryConfig::from_properties(&props).unwrap_err();
    assert_eq!(err.code(), "FLATDOC_INVALID_PROPERTY_ACCESS");
}
