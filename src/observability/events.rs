//! Observable events emitted by the engine.
//!
//! Events are explicit and typed; the string form is the `event` field of
//! the emitted log line.

use std::fmt;

/// Observable engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A collection engine was created on first use
    CollectionCreated,
    /// A query was parsed, planned and executed
    QueryExecuted,
    /// A field index was registered for a collection
    IndexRegistered,
    /// A freshly registered index finished its backfill and became ready
    IndexBackfilled,
    /// An index-update task failed and is being retried
    IndexApplyRetry,
    /// An index-update task failed permanently; the index is degraded
    IndexApplyFailed,
    /// A refresh barrier drained every field queue
    RefreshComplete,
    /// A refresh barrier timed out with queues still pending
    RefreshTimeout,
}

impl Event {
    /// Returns the event name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Event::CollectionCreated => "COLLECTION_CREATED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::IndexRegistered => "INDEX_REGISTERED",
            Event::IndexBackfilled => "INDEX_BACKFILLED",
            Event::IndexApplyRetry => "INDEX_APPLY_RETRY",
            Event::IndexApplyFailed => "INDEX_APPLY_FAILED",
            Event::RefreshComplete => "REFRESH_COMPLETE",
            Event::RefreshTimeout => "REFRESH_TIMEOUT",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
