//! Secondary indexes
//!
//! One ordered index per (collection, field), updated asynchronously from
//! the write path. Each field index owns a task queue applied in enqueue
//! order by a background worker; a bounded semaphore caps how many apply
//! tasks run at once across the engine. The refresh barrier is a token
//! pushed onto every queue.
//!
//! Index contents are a performance hint only: every candidate id is
//! re-evaluated against the committed entity store before it can appear
//! in a result, so stale or missing entries cost time, never correctness.

pub mod btree;
pub mod errors;
pub mod registry;
pub mod worker;

pub use btree::{FieldTree, IndexKey, Posting};
pub use errors::{IndexError, IndexResult};
pub use registry::IndexRegistry;
pub use worker::{ApplyUnit, FieldIndex, IndexTask, RetryPolicy};
