//! gustdb - An eventually-consistent query engine for schemaless entity collections
//!
//! Write path: entity committed to the store, one index-update task enqueued
//! per affected field index (applied asynchronously). Read path: parse ->
//! select candidates -> evaluate -> sort -> page. The `refresh` barrier makes
//! indexing appear synchronous to callers that need it.

pub mod engine;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod query;
pub mod store;
