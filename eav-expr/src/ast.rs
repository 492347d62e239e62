//! Portable filter AST.
//!
//! The compiled, host-language-independent representation of a predicate.
//! Immutable once built; the external executor evaluates it against stored
//! value rows.

use serde::{Deserialize, Serialize};

use eav_types::Value;

/// Comparison operator of a [`FilterExpr::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Substring match on a scalar text property.
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOp {
    /// Mirror an ordering operator for a flipped operand order
    /// (`5 < p.Age` is `p.Age > 5`). Equality operators are symmetric.
    pub fn flipped(self) -> CompareOp {
        match self {
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            other => other,
        }
    }
}

/// Connective of a [`FilterExpr::Logical`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// Aggregate/membership accessor over an array-valued property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayOp {
    /// Membership of a value among the element rows.
    Contains,
    /// At least one element row exists.
    Any,
    /// Element row count, compared by the executor.
    Count,
}

/// Sort direction of an [`OrderingExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Compiled predicate over one scheme's properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Constant-true or constant-false predicate. `Always(false)` marks the
    /// owning query context as provably empty.
    Always(bool),
    Compare {
        property: String,
        op: CompareOp,
        value: Value,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<FilterExpr>,
    },
    /// Null check emitted for equality comparisons against a null constant.
    IsNull { property: String, negated: bool },
    /// Membership of a property's value in a materialized constant set.
    In { property: String, values: Vec<Value> },
    /// Aggregate or membership predicate over an array property's element
    /// rows. `argument` is present for `Contains` and for `Count`
    /// comparisons carried by an enclosing [`FilterExpr::Compare`].
    ArrayMethod {
        property: String,
        method: ArrayOp,
        argument: Option<Value>,
    },
}

impl FilterExpr {
    /// Build an AND of expressions.
    #[inline]
    pub fn and_of(operands: Vec<FilterExpr>) -> FilterExpr {
        FilterExpr::Logical {
            op: LogicalOp::And,
            operands,
        }
    }

    /// Build an OR of expressions.
    #[inline]
    pub fn or_of(operands: Vec<FilterExpr>) -> FilterExpr {
        FilterExpr::Logical {
            op: LogicalOp::Or,
            operands,
        }
    }

    /// Wrap an expression in a logical NOT.
    #[allow(clippy::should_implement_trait)]
    #[inline]
    pub fn not(e: FilterExpr) -> FilterExpr {
        FilterExpr::Logical {
            op: LogicalOp::Not,
            operands: vec![e],
        }
    }
}

/// Compiled ordering key. `property` may be a synthetic aggregate name such
/// as `Tags.Count()` so the executor can target either a scalar slot or an
/// aggregate over element rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingExpr {
    pub property: String,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_simple_exprs() {
        let age = FilterExpr::Compare {
            property: "Age".into(),
            op: CompareOp::Gt,
            value: Value::Integer(5),
        };
        let name = FilterExpr::Compare {
            property: "Name".into(),
            op: CompareOp::Eq,
            value: Value::Text("x".into()),
        };
        let both = FilterExpr::and_of(vec![age.clone(), name.clone()]);
        let either = FilterExpr::or_of(vec![age, name]);
        let negated = FilterExpr::not(both);

        match either {
            FilterExpr::Logical { op, operands } => {
                assert_eq!(op, LogicalOp::Or);
                assert_eq!(operands.len(), 2);
            }
            _ => panic!("expected Or"),
        }
        match negated {
            FilterExpr::Logical { op, operands } => {
                assert_eq!(op, LogicalOp::Not);
                assert!(matches!(
                    operands[0],
                    FilterExpr::Logical {
                        op: LogicalOp::And,
                        ..
                    }
                ));
            }
            _ => panic!("expected Not"),
        }
    }

    #[test]
    fn flipped_operators() {
        assert_eq!(CompareOp::Lt.flipped(), CompareOp::Gt);
        assert_eq!(CompareOp::Ge.flipped(), CompareOp::Le);
        assert_eq!(CompareOp::Eq.flipped(), CompareOp::Eq);
    }
}
