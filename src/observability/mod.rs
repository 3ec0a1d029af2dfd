//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Atomic counters
//!
//! Observability is read-only: nothing here affects definition, access or
//! validation outcomes.
//!
//! # Usage
//!
//! ```ignore
//! use attrdef::observability::{log_event, Event, Severity};
//!
//! log_event(Severity::Info, Event::ClassDefined, &[("class", "Person")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a typed event
///
/// Fatal events are always logged at FATAL regardless of `severity`.
pub fn log_event(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        severity
    };
    Logger::emit(severity, event.as_str(), fields);
}
