//! Executor error types.

use thiserror::Error;

use crate::planner::PlanError;

/// Errors from query execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The pagination cursor could not be decoded.
    #[error("invalid pagination cursor")]
    InvalidCursor,

    /// Candidate selection failed (scan policy).
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Result type for execution operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
