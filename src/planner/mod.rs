//! Candidate selection
//!
//! Walks the query AST and picks, per predicate, the cheapest available
//! access path: an equality run or contiguous range slice of a ready
//! field index, an intersection/union of those, or a full collection
//! scan. `not`, `!=` and unindexed fields always fall back to a scan.
//! The plan is a superset selector (the executor re-applies the full
//! evaluator to every candidate), so an inexact plan is a performance
//! concern, never a correctness one.

pub mod errors;
mod explain;
mod planner;

pub use errors::{PlanError, PlanResult};
pub use planner::{CandidatePlan, Planner, ScanPlan, ScanPolicy};
