//! Predicate evaluation against a single entity.
//!
//! Evaluation is a total function: a missing field, a stored null, or a
//! comparison across type classes is a non-match, never an error. This
//! holds transitively through `not`, so `not (missing = x)` evaluates
//! true. The type classes are numeric (i64 and f64 together), string,
//! and boolean; booleans support only equality operators.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::query::{CompareOp, Expr};

/// Evaluates parsed predicates against entity field maps.
pub struct PredicateFilter;

impl PredicateFilter {
    /// True if the entity's fields satisfy the whole expression.
    pub fn matches(fields: &Map<String, Value>, expr: &Expr) -> bool {
        match expr {
            Expr::Compare { field, op, value } => match fields.get(field) {
                // missing field never matches, for every operator
                None => false,
                Some(actual) => Self::compare(actual, *op, value),
            },
            Expr::And(left, right) => {
                Self::matches(fields, left) && Self::matches(fields, right)
            }
            Expr::Or(left, right) => {
                Self::matches(fields, left) || Self::matches(fields, right)
            }
            Expr::Not(inner) => !Self::matches(fields, inner),
        }
    }

    /// Typed comparison dispatch; cross-class comparisons are false.
    fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
        match (actual, expected) {
            (Value::Bool(a), Value::Bool(b)) => match op {
                CompareOp::Eq => a == b,
                CompareOp::Ne => a != b,
                // no order defined on booleans
                _ => false,
            },
            (Value::Number(a), Value::Number(b)) => match Self::numeric_cmp(a, b) {
                Some(ordering) => Self::holds(op, ordering),
                None => false,
            },
            (Value::String(a), Value::String(b)) => Self::holds(op, a.as_str().cmp(b.as_str())),
            _ => false,
        }
    }

    /// Numeric ordering across i64/u64/f64 representations.
    /// NaN compares as unordered and therefore never matches.
    fn numeric_cmp(a: &Number, b: &Number) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
            return Some(a.cmp(&b));
        }
        match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }

    fn holds(op: CompareOp, ordering: Ordering) -> bool {
        match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn eval(query: &str, entity: Value) -> bool {
        let parsed = parse(query).unwrap();
        PredicateFilter::matches(&fields(entity), &parsed.filter.unwrap())
    }

    #[test]
    fn test_equality_by_class() {
        let e = json!({"verb": "go", "ordinal": 4, "madeup": true});
        assert!(eval("select * where verb = 'go'", e.clone()));
        assert!(eval("select * where ordinal = 4", e.clone()));
        assert!(eval("select * where madeup = true", e.clone()));
        assert!(!eval("select * where verb = 'stop'", e));
    }

    #[test]
    fn test_cross_type_comparison_is_false_not_error() {
        let e = json!({"ordinal": 4});
        assert!(!eval("select * where ordinal = '4'", e.clone()));
        assert!(!eval("select * where ordinal = true", e.clone()));
        assert!(!eval("select * where ordinal > 'x'", e));
    }

    #[test]
    fn test_int_and_float_are_one_class() {
        let e = json!({"score": 4.0});
        assert!(eval("select * where score = 4", e.clone()));
        assert!(eval("select * where score >= 3", e.clone()));
        assert!(!eval("select * where score > 4", e));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let e = json!({"verb": "go"});
        assert!(!eval("select * where ordinal = 1", e.clone()));
        assert!(!eval("select * where ordinal != 1", e.clone()));
        assert!(!eval("select * where ordinal >= 0", e));
    }

    #[test]
    fn test_missing_field_under_not_matches() {
        let e = json!({"verb": "go"});
        assert!(eval("select * where not ordinal = 1", e));
    }

    #[test]
    fn test_stored_null_never_matches() {
        let e = json!({"ordinal": null});
        assert!(!eval("select * where ordinal = 1", e.clone()));
        assert!(!eval("select * where ordinal != 1", e));
    }

    #[test]
    fn test_boolean_range_is_false() {
        let e = json!({"madeup": true});
        assert!(!eval("select * where madeup > false", e.clone()));
        assert!(eval("select * where madeup != false", e));
    }

    #[test]
    fn test_string_ordering_lexicographic() {
        let e = json!({"verb": "go"});
        assert!(eval("select * where verb < 'stop'", e.clone()));
        assert!(eval("select * where verb >= 'go'", e));
    }

    #[test]
    fn test_and_or_not_compose() {
        let e = json!({"madeup": true, "ordinal": 12});
        assert!(eval(
            "select * where madeup = true and not ordinal >= 15",
            e.clone()
        ));
        assert!(eval(
            "select * where madeup = false or ordinal >= 10",
            e.clone()
        ));
        assert!(!eval(
            "select * where (madeup = true and ordinal >= 15) or ordinal < 10",
            e
        ));
    }

    #[test]
    fn test_boolean_laws() {
        let entities = [
            json!({"a": 1, "b": 2}),
            json!({"a": 1}),
            json!({"b": 2}),
            json!({}),
            json!({"a": "x", "b": true}),
        ];
        let p = parse("select * where a = 1").unwrap().filter.unwrap();
        let q = parse("select * where b = 2").unwrap().filter.unwrap();

        for entity in entities {
            let f = fields(entity);
            let (pe, qe) = (
                PredicateFilter::matches(&f, &p),
                PredicateFilter::matches(&f, &q),
            );
            assert_eq!(
                PredicateFilter::matches(&f, &Expr::and(p.clone(), q.clone())),
                pe && qe
            );
            assert_eq!(
                PredicateFilter::matches(&f, &Expr::or(p.clone(), q.clone())),
                pe || qe
            );
            assert_eq!(
                PredicateFilter::matches(&f, &Expr::not(p.clone())),
                !pe
            );
            // De Morgan
            assert_eq!(
                PredicateFilter::matches(&f, &Expr::not(Expr::and(p.clone(), q.clone()))),
                PredicateFilter::matches(
                    &f,
                    &Expr::or(Expr::not(p.clone()), Expr::not(q.clone()))
                )
            );
        }
    }
}
