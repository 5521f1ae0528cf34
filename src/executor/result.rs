//! Result types for mutations

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::document::Document;
use crate::query::QueryError;

/// What `update` hands back
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// `false` when nothing matched or the pre-check aborted the update
    Flag(bool),
    /// The documents as written
    Documents(Vec<Document>),
}

impl UpdateOutcome {
    /// Whether any document was written
    pub fn is_applied(&self) -> bool {
        match self {
            UpdateOutcome::Flag(flag) => *flag,
            UpdateOutcome::Documents(_) => true,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            UpdateOutcome::Flag(flag) => Value::Bool(*flag),
            UpdateOutcome::Documents(documents) => documents_to_value(documents),
        }
    }
}

/// Requested shape of a delete's return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteReturn {
    /// Whether anything matched
    #[default]
    Bool,
    /// How many documents matched
    Count,
    /// The matched documents as they were before deletion
    Documents,
}

impl DeleteReturn {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteReturn::Bool => "bool",
            DeleteReturn::Count => "count",
            DeleteReturn::Documents => "documents",
        }
    }
}

impl FromStr for DeleteReturn {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bool" => Ok(DeleteReturn::Bool),
            "count" => Ok(DeleteReturn::Count),
            "documents" => Ok(DeleteReturn::Documents),
            _ => Err(QueryError::invalid_argument(format!(
                "Return option \"{}\" is not supported",
                s
            ))),
        }
    }
}

impl fmt::Display for DeleteReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `delete` hands back, computed from the selection before deletion
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Bool(bool),
    Count(usize),
    Documents(Vec<Document>),
}

impl DeleteOutcome {
    pub fn to_value(&self) -> Value {
        match self {
            DeleteOutcome::Bool(flag) => Value::Bool(*flag),
            DeleteOutcome::Count(count) => Value::from(*count),
            DeleteOutcome::Documents(documents) => documents_to_value(documents),
        }
    }
}

pub(crate) fn documents_to_value(documents: &[Document]) -> Value {
    Value::Array(documents.iter().cloned().map(Value::Object).collect())
}
