//! Engine facade
//!
//! `Engine` maps collection names to per-collection engines, creating
//! them on first use; a `CollectionEngine` owns exactly one collection's
//! entity store and field indexes and exposes the public contract:
//! create/mutate/delete, `query`, and the `refresh` barrier.

pub mod config;
mod engine;
pub mod errors;

pub use config::EngineConfig;
pub use engine::{CollectionEngine, Engine};
pub use errors::{EngineError, EngineResult};
