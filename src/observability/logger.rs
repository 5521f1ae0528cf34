//! Structured logger
//!
//! One call emits one `tracing` event carrying the event name and its
//! key/value fields. Fields are rendered as a JSON object with keys in
//! alphabetical order so the output is deterministic.

use std::fmt;

use serde_json::{Map, Value};

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-document detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Partial state left behind
    Fatal = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured logger over the `tracing` facade
pub struct Logger;

impl Logger {
    /// Log an event with the given level and fields
    pub fn log(level: LogLevel, event: &str, fields: &[(&str, &str)]) {
        let rendered = Self::render_fields(fields);
        match level {
            LogLevel::Trace => tracing::trace!(event = event, fields = %rendered),
            LogLevel::Info => tracing::info!(event = event, fields = %rendered),
            LogLevel::Warn => tracing::warn!(event = event, fields = %rendered),
            LogLevel::Error => tracing::error!(event = event, fields = %rendered),
            LogLevel::Fatal => tracing::error!(event = event, fatal = true, fields = %rendered),
        }
    }

    /// Renders fields as a JSON object, keys sorted
    pub(crate) fn render_fields(fields: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        let map: Map<String, Value> = sorted
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Value::Object(map).to_string()
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Fatal, event, fields);
    }
}
