//! Severity shared by every subsystem error.
//!
//! Error codes follow the `FLATDOC_<CATEGORY>` format. Severity tells the
//! caller whether the store is still in a known state after the failure.

use std::fmt;

/// Severity levels for flatdoc errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed, nothing on disk changed
    Error,
    /// Operation aborted after partially changing the store
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "ERROR");
        assert_eq!(Severity::Fatal.to_string(), "FATAL");
    }
}
