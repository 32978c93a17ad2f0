//! Result ordering.
//!
//! With an explicit sort spec, entities order by that field in the
//! requested direction; an entity missing the field sorts last ascending
//! and first descending ("missing sorts worst"). Ties always break by
//! creation sequence descending, regardless of direction, so any two
//! distinct entities have a defined relative order. Without a sort spec
//! the order is creation sequence descending (newest first).

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::query::{SortDirection, SortSpec};
use crate::store::Entity;

/// Sorts filtered result sets into their page order.
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts entities in place into final page order.
    pub fn sort(entities: &mut [Arc<Entity>], spec: Option<&SortSpec>) {
        entities.sort_by(|a, b| Self::compare(a, b, spec));
    }

    /// The total page order: sort field first, then creation sequence
    /// descending. Also used to position pagination cursors.
    pub fn compare(a: &Entity, b: &Entity, spec: Option<&SortSpec>) -> Ordering {
        if let Some(spec) = spec {
            let ordering = Self::compare_field(a.field(&spec.field), b.field(&spec.field));
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        b.created_seq.cmp(&a.created_seq)
    }

    /// Field-value ordering with the missing-sorts-worst policy: an
    /// absent field compares greater than any present value, so it lands
    /// last ascending and (after reversal) first descending.
    pub(crate) fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => Self::compare_values(a, b),
        }
    }

    /// Deterministic cross-type value order: bool < number < string,
    /// with nulls, arrays and objects after all scalars.
    fn compare_values(a: &Value, b: &Value) -> Ordering {
        let rank = |v: &Value| -> u8 {
            match v {
                Value::Bool(_) => 0,
                Value::Number(_) => 1,
                Value::String(_) => 2,
                _ => 3,
            }
        };

        match rank(a).cmp(&rank(b)) {
            Ordering::Equal => match (a, b) {
                (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
                (Value::Number(a), Value::Number(b)) => {
                    let a = a.as_f64().unwrap_or(0.0);
                    let b = b.as_f64().unwrap_or(0.0);
                    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
                }
                (Value::String(a), Value::String(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            unequal => unequal,
        }
    }
}
