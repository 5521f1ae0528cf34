//! Observability for flatdoc
//!
//! - Structured logging through `tracing`
//! - Monotonic counters
//! - Typed lifecycle events
//!
//! Observability never changes the outcome of an operation.
//!
//! ```ignore
//! use flatdoc::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::CacheHit, &[("key", key.as_str())]);
//!
//! let scope = ObservationScope::new("DELETE");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{LogLevel, Logger};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields; fatal events log at FATAL
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let level = if event.is_fatal() {
        LogLevel::Fatal
    } else {
        LogLevel::Info
    };
    Logger::log(level, event.as_str(), fields);
}
