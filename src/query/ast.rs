//! Parsed query representation.

use serde_json::Value;

/// Comparison operators.
///
/// Symbolic (`>=`) and word (`gte`) spellings lex to the same operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Returns the canonical word spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }

    /// Returns true for the order-based operators.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte
        )
    }
}

/// A boolean predicate over one entity's field set.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field op literal`
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Expr::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Returns every field name referenced by a comparison, deduplicated,
    /// in first-appearance order.
    pub fn comparison_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Compare { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            Expr::Not(inner) => inner.collect_fields(out),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specification from an `order by` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A fully parsed query.
///
/// `filter: None` means match-all (`select *` with no `where` clause);
/// `sort: None` means default order, creation sequence descending.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub filter: Option<Expr>,
    pub sort: Option<SortSpec>,
}

impl ParsedQuery {
    /// The query that matches every entity in default order.
    pub fn match_all() -> Self {
        Self {
            filter: None,
            sort: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expr_builders() {
        let expr = Expr::and(
            Expr::compare("madeup", CompareOp::Eq, json!(true)),
            Expr::not(Expr::compare("ordinal", CompareOp::Gte, json!(15))),
        );
        match expr {
            Expr::And(l, r) => {
                assert!(matches!(*l, Expr::Compare { .. }));
                assert!(matches!(*r, Expr::Not(_)));
            }
            _ => panic!("expected And at the root"),
        }
    }

    #[test]
    fn test_comparison_fields_deduplicated() {
        let expr = Expr::or(
            Expr::and(
                Expr::compare("verb", CompareOp::Eq, json!("go")),
                Expr::compare("ordinal", CompareOp::Gte, json!(22)),
            ),
            Expr::compare("verb", CompareOp::Eq, json!("stop")),
        );
        assert_eq!(expr.comparison_fields(), vec!["verb", "ordinal"]);
    }

    #[test]
    fn test_operator_classes() {
        assert!(CompareOp::Gte.is_range());
        assert!(CompareOp::Lt.is_range());
        assert!(!CompareOp::Eq.is_range());
        assert!(!CompareOp::Ne.is_range());
    }

    #[test]
    fn test_sort_spec_builders() {
        let spec = SortSpec::desc("ordinal");
        assert_eq!(spec.field, "ordinal");
        assert_eq!(spec.direction, SortDirection::Desc);
        assert_eq!(spec.direction.as_str(), "desc");
    }
}
