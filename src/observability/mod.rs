//! Observability for ingest runs
//!
//! This module provides:
//! - Structured JSON logging to stderr
//! - Typed lifecycle events
//! - Begin/complete scopes around an operation
//!
//! Logging is synchronous and has no effect on ingest results.
//!
//! ```ignore
//! use votable_ingest::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::ConstraintsLoaded, &[("catalog", "collection_catalogue")]);
//!
//! let scope = ObservationScope::new("INGEST");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

/// Logs a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Logs a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Logs a lifecycle event at an explicit severity
pub fn log_event_at(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}
