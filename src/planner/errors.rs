//! Planner error types.

use thiserror::Error;

/// Errors from candidate selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The plan needs a full scan but engine policy forbids scans.
    #[error("no usable index for field `{field}` and full scans are disabled")]
    IndexUnavailable { field: String },
}

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;
