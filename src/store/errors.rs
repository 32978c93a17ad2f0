//! Store error types.

use thiserror::Error;

use super::entity::EntityId;

/// Errors from the committed entity view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Mutation or delete addressed an entity that does not exist.
    #[error("entity `{id}` does not exist")]
    UnknownEntity { id: EntityId },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
