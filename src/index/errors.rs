//! Index error types.

use thiserror::Error;

/// Errors from index maintenance.
///
/// These surface on the write path (enqueue) or inside background
/// workers; they are never returned from query evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The field's update queue is closed (engine shutting down).
    #[error("index update queue for field `{field}` is closed")]
    QueueClosed { field: String },

    /// An index-update task could not be applied.
    #[error("failed to apply index update for field `{field}`: {reason}")]
    ApplyFailed { field: String, reason: String },
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
