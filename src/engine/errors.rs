//! Engine error types.
//!
//! Facade-level aggregation of the module errors. Evaluation-time type
//! mismatches are absorbed as non-matches long before this layer;
//! background index-update failures are retried and logged, never
//! surfaced here except as refresh pressure.

use std::time::Duration;

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::index::IndexError;
use crate::query::ParseError;
use crate::store::StoreError;

/// Errors surfaced by the engine's public contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed query string; nothing was executed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Query execution failed (bad cursor, scan policy).
    #[error(transparent)]
    Execute(#[from] ExecutorError),

    /// Mutation or delete addressed an unknown entity.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An index queue rejected a barrier token.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The refresh barrier did not drain in time. The backlog stays
    /// queued and will still drain; nothing is rolled back.
    #[error("refresh did not drain within {timeout:?}; {pending} queue(s) still pending")]
    RefreshTimeout { timeout: Duration, pending: usize },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
