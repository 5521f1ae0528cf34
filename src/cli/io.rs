//! JSON I/O handling for CLI
//!
//! - Input: one JSON object via stdin; empty input is an empty request
//! - Output: one JSON object via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::{CliError, CliResult};

/// One request read from stdin
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Request {
    /// Query property overrides
    #[serde(default)]
    pub query: Map<String, Value>,

    /// Dot-path → value, for `update`
    #[serde(default)]
    pub updates: Map<String, Value>,

    /// For `update`: return the written documents instead of `true`
    #[serde(default)]
    pub return_documents: bool,

    /// For `delete`: "bool", "count" or "documents"
    #[serde(default)]
    pub return_option: Option<String>,
}

impl Request {
    pub fn parse(input: &str) -> CliResult<Self> {
        if input.trim().is_empty() {
            return Ok(Request::default());
        }
        let value: Value = serde_json::from_str(input)?;
        if !value.is_object() {
            return Err(CliError::request("request must be a JSON object"));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Request> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    Request::parse(&input)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(&response)
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_default_request() {
        assert_eq!(Request::parse("  \n").unwrap(), Request::default());
    }

    #[test]
    fn test_parse_full_request() {
        let request = Request::parse(
            r#"{"query": {"limit": 2}, "updates": {"a.b": 1}, "returnDocuments": true, "returnOption": "count"}"#,
        )
        .unwrap();
        assert_eq!(request.query.get("limit"), Some(&json!(2)));
        assert_eq!(request.updates.get("a.b"), Some(&json!(1)));
        assert!(request.return_documents);
        assert_eq!(request.return_option.as_deref(), Some("count"));
    }

    #[test]
    fn test_rejects_unknown_fields_and_non_objects() {
        assert!(Request::parse(r#"{"op": "query"}"#).is_err());
        assert!(Request::parse("[1, 2]").is_err());
        assert!(Request::parse("{oops").is_err());
    }
}
