//! Plan rendering for logs and diagnostics.

use std::fmt;
use std::ops::Bound;

use crate::index::IndexKey;

use super::planner::ScanPlan;

impl fmt::Display for ScanPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPlan::IndexEq { field, .. } => write!(f, "INDEX_EQ({})", field),
            ScanPlan::IndexRange { field, lower, upper } => {
                write!(
                    f,
                    "INDEX_RANGE({} {}..{})",
                    field,
                    render_bound(lower),
                    render_bound(upper)
                )
            }
            ScanPlan::Intersect(l, r) => write!(f, "INTERSECT({}, {})", l, r),
            ScanPlan::Union(l, r) => write!(f, "UNION({}, {})", l, r),
            ScanPlan::FullScan => write!(f, "FULL_SCAN"),
        }
    }
}

fn render_bound(bound: &Bound<IndexKey>) -> String {
    match bound {
        Bound::Unbounded => "*".to_string(),
        Bound::Included(key) => render_key(key),
        Bound::Excluded(key) => format!("({})", render_key(key)),
    }
}

fn render_key(key: &IndexKey) -> String {
    match key {
        IndexKey::Bool(b) => b.to_string(),
        IndexKey::Num(bits) => {
            // undo the total-order encoding for display
            let raw = if (bits >> 63) == 1 {
                bits ^ (1 << 63)
            } else {
                !bits
            };
            f64::from_bits(raw).to_string()
        }
        IndexKey::Str(s) => format!("'{}'", s),
    }
}
