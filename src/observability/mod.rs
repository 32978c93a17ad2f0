//! Observability for gustdb
//!
//! Structured single-line JSON logging with deterministic field ordering.
//! Logging is read-only with respect to the engine: no side effects on
//! query results, no buffering, no background threads.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
