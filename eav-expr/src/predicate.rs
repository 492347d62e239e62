//! Host-side predicate expression trees.
//!
//! A [`PredicateNode`] is the in-memory stand-in for a host-language lambda
//! expression: property accesses, constants, binary operators, negation, and
//! method calls. Callers build trees with the fluent helpers ([`field`],
//! [`lit`], [`computed`]) and hand them to the
//! [`ExpressionCompiler`](crate::compile::ExpressionCompiler), which lowers
//! them into the portable [`FilterExpr`](crate::ast::FilterExpr) AST.

use std::fmt;
use std::sync::Arc;

use eav_types::Value;

/// Binary operator appearing in a predicate tree. Logical and comparison
/// operators share the node shape; the compiler tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Method name appearing in a call node. `Contains` is deliberately shared
/// between string predicates, array membership, and constant-collection
/// membership; resolution order is the compiler's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Contains,
    StartsWith,
    EndsWith,
    Any,
    Count,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Contains => "Contains",
            Method::StartsWith => "StartsWith",
            Method::EndsWith => "EndsWith",
            Method::Any => "Any",
            Method::Count => "Count",
        }
    }
}

/// One node of a host-side predicate expression tree.
#[derive(Clone)]
pub enum PredicateNode {
    /// Access of a record property by name.
    Property(String),
    /// An already-materialized constant.
    Constant(Value),
    /// A closed sub-expression producing a constant; invoked once during
    /// compilation, mirroring compile-and-invoke of captured expressions.
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
    Binary {
        op: BinaryOp,
        left: Box<PredicateNode>,
        right: Box<PredicateNode>,
    },
    Not(Box<PredicateNode>),
    Call {
        receiver: Box<PredicateNode>,
        method: Method,
        args: Vec<PredicateNode>,
    },
}

impl fmt::Debug for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateNode::Property(name) => f.debug_tuple("Property").field(name).finish(),
            PredicateNode::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            PredicateNode::Computed(_) => f.write_str("Computed(<closure>)"),
            PredicateNode::Binary { op, left, right } => f
                .debug_struct("Binary")
                .field("op", op)
                .field("left", left)
                .field("right", right)
                .finish(),
            PredicateNode::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            PredicateNode::Call {
                receiver,
                method,
                args,
            } => f
                .debug_struct("Call")
                .field("receiver", receiver)
                .field("method", method)
                .field("args", args)
                .finish(),
        }
    }
}

/// Node kind label used by unsupported-construct errors.
impl PredicateNode {
    pub fn kind(&self) -> &'static str {
        match self {
            PredicateNode::Property(_) => "property access",
            PredicateNode::Constant(_) => "constant",
            PredicateNode::Computed(_) => "computed constant",
            PredicateNode::Binary { .. } => "binary operator",
            PredicateNode::Not(_) => "negation",
            PredicateNode::Call { .. } => "method call",
        }
    }
}

/// Start a predicate from a property access: `field("Age").gt(5)`.
pub fn field(name: impl Into<String>) -> PredicateNode {
    PredicateNode::Property(name.into())
}

/// Lift a constant into a predicate node.
pub fn lit(value: impl Into<Value>) -> PredicateNode {
    PredicateNode::Constant(value.into())
}

/// Defer a constant to compile time; the closure runs once per compilation.
pub fn computed<F>(f: F) -> PredicateNode
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    PredicateNode::Computed(Arc::new(f))
}

macro_rules! impl_from_for_node {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PredicateNode {
                fn from(v: $t) -> Self {
                    PredicateNode::Constant(v.into())
                }
            }
        )*
    };
}

impl_from_for_node!(
    i8, i16, i32, i64, u8, u16, u32, f32, f64, bool, &str, String, uuid::Uuid, Value
);

impl PredicateNode {
    fn binary(op: BinaryOp, left: PredicateNode, right: PredicateNode) -> PredicateNode {
        PredicateNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Eq, self, rhs.into())
    }

    pub fn ne(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Ne, self, rhs.into())
    }

    pub fn gt(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Gt, self, rhs.into())
    }

    pub fn ge(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Ge, self, rhs.into())
    }

    pub fn lt(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Lt, self, rhs.into())
    }

    pub fn le(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Le, self, rhs.into())
    }

    pub fn and(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::And, self, rhs.into())
    }

    pub fn or(self, rhs: impl Into<PredicateNode>) -> PredicateNode {
        Self::binary(BinaryOp::Or, self, rhs.into())
    }

    /// Logical negation. Named `negate` to avoid clashing with `ops::Not`.
    pub fn negate(self) -> PredicateNode {
        PredicateNode::Not(Box::new(self))
    }

    fn call(self, method: Method, args: Vec<PredicateNode>) -> PredicateNode {
        PredicateNode::Call {
            receiver: Box::new(self),
            method,
            args,
        }
    }

    /// `Contains` on a string property, an array property, or a constant
    /// collection; the compiler resolves which by the receiver's shape.
    pub fn contains(self, arg: impl Into<PredicateNode>) -> PredicateNode {
        self.call(Method::Contains, vec![arg.into()])
    }

    pub fn starts_with(self, arg: impl Into<PredicateNode>) -> PredicateNode {
        self.call(Method::StartsWith, vec![arg.into()])
    }

    pub fn ends_with(self, arg: impl Into<PredicateNode>) -> PredicateNode {
        self.call(Method::EndsWith, vec![arg.into()])
    }

    /// Zero-argument existence accessor over an array property.
    pub fn any(self) -> PredicateNode {
        self.call(Method::Any, Vec::new())
    }

    /// Zero-argument element count accessor over an array property.
    pub fn count(self) -> PredicateNode {
        self.call(Method::Count, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_shapes() {
        let p = field("Age").gt(5).and(field("Name").eq("x"));
        match p {
            PredicateNode::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                assert!(matches!(
                    *left,
                    PredicateNode::Binary {
                        op: BinaryOp::Gt,
                        ..
                    }
                ));
                assert!(matches!(
                    *right,
                    PredicateNode::Binary {
                        op: BinaryOp::Eq,
                        ..
                    }
                ));
            }
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn call_shapes() {
        let c = field("Tags").contains("x");
        match c {
            PredicateNode::Call {
                receiver,
                method: Method::Contains,
                args,
            } => {
                assert!(matches!(*receiver, PredicateNode::Property(_)));
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected Call, got {:?}", other),
        }
        assert!(matches!(
            field("Tags").count(),
            PredicateNode::Call { args, .. } if args.is_empty()
        ));
    }
}
