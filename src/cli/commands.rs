//! CLI command implementations
//!
//! Each invocation loads the store configuration, opens the store, reads
//! one request and writes one response.

use std::path::Path;

use serde_json::Value;

use crate::executor::{DeleteReturn, Query};
use crate::query::QueryConfig;
use crate::store::{Store, StoreConfig};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response, Request};

/// Parse arguments and run; failures are also reported on stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_command(&cli.config, cli.command);
    if let Err(err) = &result {
        write_error(err.code(), &err.to_string())?;
    }
    result
}

/// Run one command against the store described by `config_path`
pub fn run_command(config_path: &Path, command: Command) -> CliResult<()> {
    let config = StoreConfig::load(config_path)?;
    let store = Store::open(config)?;
    let request = read_request()?;
    let data = execute(&store, command, &request)?;
    write_response(data)
}

/// Executes `request` and returns the response payload
pub fn execute(store: &Store, command: Command, request: &Request) -> CliResult<Value> {
    let query = build_query(store, &request.query)?;

    let data = match command {
        Command::Fetch => documents_value(query.fetch()?),
        Command::First => query
            .first()?
            .map_or_else(|| Value::Array(Vec::new()), Value::Object),
        Command::Exists => Value::Bool(query.exists()?),
        Command::Update => {
            if request.updates.is_empty() {
                return Err(CliError::request("\"updates\" must not be empty"));
            }
            query
                .update(&request.updates, request.return_documents)?
                .to_value()
        }
        Command::Delete => {
            let option = match request.return_option.as_deref() {
                Some(raw) => raw.parse::<DeleteReturn>()?,
                None => DeleteReturn::default(),
            };
            query.delete(option)?.to_value()
        }
    };
    Ok(data)
}

/// Overlays the request's properties on the store's query defaults
fn build_query(store: &Store, overrides: &serde_json::Map<String, Value>) -> CliResult<Query> {
    let base = store.query_config().to_properties();
    let properties = QueryConfig::merge_properties(base, overrides)?;
    let config = QueryConfig::from_properties(&properties)?;
    Ok(store.query(config))
}

fn documents_value(documents: Vec<crate::document::Document>) -> Value {
    Value::Array(documents.into_iter().map(Value::Object).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(dir.path().join("users"))).unwrap();
        for doc in [
            json!({"_id": 1, "name": "ada", "age": 20}),
            json!({"_id": 2, "name": "bob", "age": 30}),
            json!({"_id": 3, "name": "cy", "age": 40}),
        ] {
            let stem = doc["_id"].to_string();
            fs::write(store.document_path(&stem), doc.to_string()).unwrap();
        }
        (dir, store)
    }

    fn request(value: Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_fetch_with_overrides() {
        let (_dir, store) = setup();
        let req = request(json!({
            "query": {
                "conditions": ["age", ">", 25],
                "orderBy": [{"field": "age", "direction": "desc"}],
                "fieldsToSelect": ["name"]
            }
        }));
        let data = execute(&store, Command::Fetch, &req).unwrap();
        assert_eq!(
            data,
            json!([{"_id": 3, "name": "cy"}, {"_id": 2, "name": "bob"}])
        );
    }

    #[test]
    fn test_first_without_match_is_empty_array() {
        let (_dir, store) = setup();
        let req = request(json!({"query": {"conditions": ["age", ">", 99]}}));
        assert_eq!(execute(&store, Command::First, &req).unwrap(), json!([]));
        assert_eq!(execute(&store, Command::Exists, &req).unwrap(), json!(false));
    }

    #[test]
    fn test_unknown_query_property_rejected() {
        let (_dir, store) = setup();
        let req = request(json!({"query": {"where": []}}));
        let err = execute(&store, Command::Fetch, &req).unwrap_err();
        assert_eq!(err.code(), "FLATDOC_INVALID_ARGUMENT");
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, store) = setup();
        let req = request(json!({
            "query": {"conditions": ["name", "=", "bob"]},
            "updates": {"age": 31},
            "returnDocuments": true
        }));
        let data = execute(&store, Command::Update, &req).unwrap();
        assert_eq!(data, json!([{"_id": 2, "name": "bob", "age": 31}]));

        let req = request(json!({"query": {"conditions": ["age", "<", 35]}, "returnOption": "count"}));
        assert_eq!(execute(&store, Command::Delete, &req).unwrap(), json!(2));
        assert_eq!(execute(&store, Command::Fetch, &Request::default()).unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_bad_return_option() {
        let (_dir, store) = setup();
        let req = request(json!({"returnOption": "rows"}));
        let err = execute(&store, Command::Delete, &req).unwrap_err();
        assert_eq!(err.code(), "FLATDOC_INVALID_ARGUMENT");
        assert_eq!(store.data_path().read_dir().unwrap().count(), 3);
    }

    #[test]
    fn test_update_requires_updates() {
        let (_dir, store) = setup();
        let err = execute(&store, Command::Update, &Request::default()).unwrap_err();
        assert_eq!(err.code(), "FLATDOC_CLI_INVALID_REQUEST");
    }
}
