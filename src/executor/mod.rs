//! Result pipeline
//!
//! Resolves a candidate plan to entities, re-applies the full predicate
//! evaluator, sorts, applies the pagination cursor and truncates to the
//! page limit. The whole pipeline is a pure read: it never blocks on the
//! index-update queues and has no side effects.

pub mod cursor;
pub mod errors;
mod executor;
pub mod filters;
pub mod result;
pub mod sorter;

pub use cursor::Cursor;
pub use errors::{ExecutorError, ExecutorResult};
pub use executor::{QueryExecutor, QueryParams};
pub use filters::PredicateFilter;
pub use result::QueryPage;
pub use sorter::ResultSorter;
