//! Observable events
//!
//! Every lifecycle point the engine reports is named here. Events are
//! explicit and typed.

use std::fmt;

/// Observable events in flatdoc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Store configuration loaded
    ConfigLoaded,

    // Query
    /// Query execution begins
    QueryBegin,
    /// Query execution produced a result
    QueryComplete,

    // Cache
    /// Cached result served
    CacheHit,
    /// No usable cached result
    CacheMiss,
    /// Result written to the cache
    CacheStore,
    /// Cached entry dropped before lookup on request
    CacheRegenerate,
    /// Lifetime-less entries dropped after a mutation
    CacheInvalidated,

    // Scan
    /// Document skipped because it could not be read or decoded
    DocumentSkipped,

    // Mutation (begin/complete are logged by ObservationScope)
    /// Update abandoned before any write
    UpdateAborted,
    /// Delete stopped partway (FATAL)
    DeleteAborted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::QueryBegin => "QUERY_BEGIN",
            Event::QueryComplete => "QUERY_COMPLETE",

            Event::CacheHit => "CACHE_HIT",
            Event::CacheMiss => "CACHE_MISS",
            Event::CacheStore => "CACHE_STORE",
            Event::CacheRegenerate => "CACHE_REGENERATE",
            Event::CacheInvalidated => "CACHE_INVALIDATED",

            Event::DocumentSkipped => "DOCUMENT_SKIPPED",
            Event::UpdateAborted => "UPDATE_ABORTED",
            Event::DeleteAborted => "DELETE_ABORTED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::DeleteAborted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::QueryBegin,
            Event::QueryComplete,
            Event::CacheHit,
            Event::CacheMiss,
            Event::CacheStore,
            Event::CacheRegenerate,
            Event::CacheInvalidated,
            Event::DocumentSkipped,
            Event::UpdateAborted,
            Event::DeleteAborted,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::DeleteAborted.is_fatal());
        assert!(!Event::UpdateAborted.is_fatal());
        assert!(!Event::QueryComplete.is_fatal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::CacheHit), "CACHE_HIT");
    }
}
