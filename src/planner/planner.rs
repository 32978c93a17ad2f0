//! Plan construction over the query AST.

use std::ops::Bound;

use serde_json::Value;

use crate::index::{IndexKey, IndexRegistry};
use crate::query::{CompareOp, Expr};

use super::errors::{PlanError, PlanResult};

/// Whether a plan may fall back to a full collection scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPolicy {
    /// Scans are always permitted (default)
    #[default]
    Allow,
    /// Plans that need a scan fail with `IndexUnavailable`
    Deny,
}

/// An access path producing candidate entity ids.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanPlan {
    /// The equal-value run of one field index
    IndexEq { field: String, key: IndexKey },
    /// A contiguous slice of one field index
    IndexRange {
        field: String,
        lower: Bound<IndexKey>,
        upper: Bound<IndexKey>,
    },
    /// Candidates in both sides (the executor drives the smaller side)
    Intersect(Box<ScanPlan>, Box<ScanPlan>),
    /// Candidates in either side, deduplicated by entity id
    Union(Box<ScanPlan>, Box<ScanPlan>),
    /// Every live entity in the collection
    FullScan,
}

impl ScanPlan {
    pub fn is_full_scan(&self) -> bool {
        matches!(self, ScanPlan::FullScan)
    }
}

/// A scan plan plus whether its candidate set equals the match set.
///
/// The flag is advisory: the executor re-applies the evaluator to every
/// candidate either way.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePlan {
    pub scan: ScanPlan,
    pub exact: bool,
}

impl CandidatePlan {
    fn scan_all() -> Self {
        Self {
            scan: ScanPlan::FullScan,
            exact: false,
        }
    }
}

/// Picks candidate access paths for a parsed filter.
pub struct Planner<'a> {
    registry: &'a IndexRegistry,
    policy: ScanPolicy,
}

impl<'a> Planner<'a> {
    pub fn new(registry: &'a IndexRegistry, policy: ScanPolicy) -> Self {
        Self { registry, policy }
    }

    /// Plans candidate selection for `filter` (`None` = match-all).
    pub fn plan(&self, filter: Option<&Expr>) -> PlanResult<CandidatePlan> {
        let plan = match filter {
            // match-all: the scan itself is the exact answer
            None => CandidatePlan {
                scan: ScanPlan::FullScan,
                exact: true,
            },
            Some(expr) => self.plan_expr(expr),
        };

        if self.policy == ScanPolicy::Deny && plan.scan.is_full_scan() {
            return Err(PlanError::IndexUnavailable {
                field: Self::offending_field(filter),
            });
        }
        Ok(plan)
    }

    fn plan_expr(&self, expr: &Expr) -> CandidatePlan {
        match expr {
            Expr::Compare { field, op, value } => self.plan_compare(field, *op, value),
            Expr::And(left, right) => {
                let l = self.plan_expr(left);
                let r = self.plan_expr(right);
                match (l.scan.is_full_scan(), r.scan.is_full_scan()) {
                    (true, true) => CandidatePlan::scan_all(),
                    // one indexed side bounds the candidates; the other
                    // predicate is recovered by evaluation
                    (true, false) => CandidatePlan {
                        scan: r.scan,
                        exact: false,
                    },
                    (false, true) => CandidatePlan {
                        scan: l.scan,
                        exact: false,
                    },
                    (false, false) => CandidatePlan {
                        exact: l.exact && r.exact,
                        scan: ScanPlan::Intersect(Box::new(l.scan), Box::new(r.scan)),
                    },
                }
            }
            Expr::Or(left, right) => {
                let l = self.plan_expr(left);
                let r = self.plan_expr(right);
                if l.scan.is_full_scan() || r.scan.is_full_scan() {
                    // a union with a scan side is just a scan
                    CandidatePlan::scan_all()
                } else {
                    CandidatePlan {
                        exact: l.exact && r.exact,
                        scan: ScanPlan::Union(Box::new(l.scan), Box::new(r.scan)),
                    }
                }
            }
            Expr::Not(_) => CandidatePlan::scan_all(),
        }
    }

    fn plan_compare(&self, field: &str, op: CompareOp, value: &Value) -> CandidatePlan {
        if op == CompareOp::Ne {
            return CandidatePlan::scan_all();
        }
        if self.registry.ready(field).is_none() {
            return CandidatePlan::scan_all();
        }
        let Some(key) = IndexKey::from_value(value) else {
            return CandidatePlan::scan_all();
        };

        // Strict bounds are widened to inclusive: numeric keys are f64
        // normalized, so an exclusive bound could drop a boundary-equal
        // candidate that the evaluator would keep. The evaluator trims
        // boundary values either way.
        let scan = match op {
            CompareOp::Eq => ScanPlan::IndexEq {
                field: field.to_string(),
                key,
            },
            CompareOp::Gt | CompareOp::Gte => ScanPlan::IndexRange {
                field: field.to_string(),
                lower: Bound::Included(key),
                upper: Bound::Unbounded,
            },
            CompareOp::Lt | CompareOp::Lte => ScanPlan::IndexRange {
                field: field.to_string(),
                lower: Bound::Unbounded,
                upper: Bound::Included(key),
            },
            CompareOp::Ne => unreachable!("handled above"),
        };
        CandidatePlan { scan, exact: true }
    }

    /// First field that forced the scan, for `IndexUnavailable`.
    fn offending_field(filter: Option<&Expr>) -> String {
        filter
            .and_then(|expr| {
                expr.comparison_fields()
                    .into_iter()
                    .next()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "*".to_string())
    }
}
