//! Observability: structured logging and counters
//!
//! - Structured JSON log lines on stderr, filtered by severity
//! - Lock-free counters per recipe instance
//!
//! Observability is read-only: it never changes the outcome of a dump,
//! load or bake.
//!
//! ```ignore
//! use record_recipe::observability::{Logger, Severity};
//!
//! Logger::set_threshold(Severity::Info);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
