//! Lowering of host-side predicate trees into the portable filter AST.
//!
//! Traversal follows a fixed precedence, because array-method calls are
//! syntactically also plain method calls:
//!
//! 1. logical binaries (`&&`, `||`)
//! 2. comparisons, with the constant side materialized (including invoking
//!    deferred computed constants) and null equality rewritten to
//!    [`FilterExpr::IsNull`]
//! 3. boolean shorthands (bare property, negated property, bare constant)
//! 4. array `any`/`count`/`contains` on an array-valued property
//! 5. string `contains`/`starts_with`/`ends_with` on a scalar property
//! 6. constant-collection `contains(property)` → [`FilterExpr::In`]
//!
//! Anything else fails with [`Error::Unsupported`] naming the node kind;
//! never a silent fallback.

use eav_result::{Error, Result};
use eav_types::{TypeDescription, Value};

use crate::ast::{ArrayOp, CompareOp, Direction, FilterExpr, LogicalOp, OrderingExpr};
use crate::predicate::{BinaryOp, Method, PredicateNode};

/// Default bound on nested logical expressions.
pub const DEFAULT_MAX_LOGICAL_DEPTH: usize = 64;

/// Compiles predicate/ordering expressions against one record type.
///
/// The type description is consulted for field shapes: `contains` on an
/// array-valued property compiles to an array-membership node, while the
/// same call on a scalar text property compiles to a substring comparison.
pub struct ExpressionCompiler<'a> {
    description: &'a TypeDescription,
    max_depth: usize,
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(description: &'a TypeDescription) -> Self {
        Self {
            description,
            max_depth: DEFAULT_MAX_LOGICAL_DEPTH,
        }
    }

    /// Override the nested-logical-expression bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compile a predicate tree into a [`FilterExpr`].
    pub fn compile(&self, node: &PredicateNode) -> Result<FilterExpr> {
        self.compile_node(node, 0)
    }

    /// Compile an ordering key selector into an [`OrderingExpr`].
    ///
    /// The selector must be a plain property access or a zero-argument
    /// `count()` over an array property (compiled to the synthetic
    /// `Field.Count()` aggregate name).
    pub fn compile_ordering(
        &self,
        selector: &PredicateNode,
        direction: Direction,
    ) -> Result<OrderingExpr> {
        let property = self.property_name(selector).ok_or_else(|| {
            Error::unsupported(format!(
                "ordering key must be a property access, got {}",
                selector.kind()
            ))
        })?;
        Ok(OrderingExpr {
            property,
            direction,
        })
    }

    fn compile_node(&self, node: &PredicateNode, depth: usize) -> Result<FilterExpr> {
        match node {
            PredicateNode::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    if depth >= self.max_depth {
                        return Err(Error::unsupported(format!(
                            "logical expression nesting exceeds {} levels",
                            self.max_depth
                        )));
                    }
                    let operands = vec![
                        self.compile_node(left, depth + 1)?,
                        self.compile_node(right, depth + 1)?,
                    ];
                    Ok(FilterExpr::Logical {
                        op: if *op == BinaryOp::And {
                            LogicalOp::And
                        } else {
                            LogicalOp::Or
                        },
                        operands,
                    })
                }
                _ => self.compile_comparison(*op, left, right),
            },
            PredicateNode::Not(inner) => match inner.as_ref() {
                // `!p.Active` is shorthand for `p.Active == false`.
                PredicateNode::Property(name) => Ok(FilterExpr::Compare {
                    property: name.clone(),
                    op: CompareOp::Eq,
                    value: Value::Boolean(false),
                }),
                other => {
                    if depth >= self.max_depth {
                        return Err(Error::unsupported(format!(
                            "logical expression nesting exceeds {} levels",
                            self.max_depth
                        )));
                    }
                    Ok(FilterExpr::not(self.compile_node(other, depth + 1)?))
                }
            },
            // A bare boolean property is shorthand for `== true`.
            PredicateNode::Property(name) => Ok(FilterExpr::Compare {
                property: name.clone(),
                op: CompareOp::Eq,
                value: Value::Boolean(true),
            }),
            PredicateNode::Constant(_) | PredicateNode::Computed(_) => {
                match constant_value(node) {
                    Some(Value::Boolean(b)) => Ok(FilterExpr::Always(b)),
                    Some(other) => Err(Error::unsupported(format!(
                        "bare {} constant is not a predicate",
                        other.kind()
                    ))),
                    None => Err(Error::unsupported(node.kind())),
                }
            }
            PredicateNode::Call {
                receiver,
                method,
                args,
            } => self.compile_call(receiver, *method, args),
        }
    }

    fn compile_comparison(
        &self,
        op: BinaryOp,
        left: &PredicateNode,
        right: &PredicateNode,
    ) -> Result<FilterExpr> {
        let cmp = match op {
            BinaryOp::Eq => CompareOp::Eq,
            BinaryOp::Ne => CompareOp::Ne,
            BinaryOp::Gt => CompareOp::Gt,
            BinaryOp::Ge => CompareOp::Ge,
            BinaryOp::Lt => CompareOp::Lt,
            BinaryOp::Le => CompareOp::Le,
            BinaryOp::And | BinaryOp::Or => unreachable!("handled by compile_node"),
        };

        // Determine which side is the property access; the other side is
        // evaluated to a constant. A flipped operand order mirrors the
        // operator (`5 < p.Age` becomes `p.Age > 5`).
        let (property, value, cmp) = if let Some(property) = self.property_name(left) {
            let value = constant_value(right).ok_or_else(|| {
                Error::unsupported(format!(
                    "comparison against {} (expected a constant)",
                    right.kind()
                ))
            })?;
            (property, value, cmp)
        } else if let Some(property) = self.property_name(right) {
            let value = constant_value(left).ok_or_else(|| {
                Error::unsupported(format!(
                    "comparison against {} (expected a constant)",
                    left.kind()
                ))
            })?;
            (property, value, cmp.flipped())
        } else {
            return Err(Error::unsupported(format!(
                "comparison between {} and {} (no property operand)",
                left.kind(),
                right.kind()
            )));
        };

        // Equality against null becomes a null check, not a comparison.
        if value.is_null() && matches!(cmp, CompareOp::Eq | CompareOp::Ne) {
            return Ok(FilterExpr::IsNull {
                property,
                negated: cmp == CompareOp::Ne,
            });
        }

        Ok(FilterExpr::Compare {
            property,
            op: cmp,
            value,
        })
    }

    fn compile_call(
        &self,
        receiver: &PredicateNode,
        method: Method,
        args: &[PredicateNode],
    ) -> Result<FilterExpr> {
        // Array accessors on a property take priority over every other
        // method-call reading, including constant-collection membership.
        if let PredicateNode::Property(name) = receiver {
            match method {
                Method::Any | Method::Count if args.is_empty() => {
                    self.require_array(name, method.name())?;
                    return Ok(FilterExpr::ArrayMethod {
                        property: name.clone(),
                        method: if method == Method::Any {
                            ArrayOp::Any
                        } else {
                            ArrayOp::Count
                        },
                        argument: None,
                    });
                }
                Method::Contains | Method::StartsWith | Method::EndsWith if args.len() == 1 => {
                    let argument = constant_value(&args[0]).ok_or_else(|| {
                        Error::unsupported(format!(
                            "{} argument of kind {} (expected a constant)",
                            method.name(),
                            args[0].kind()
                        ))
                    })?;
                    if method == Method::Contains && self.description.is_array_field(name) {
                        return Ok(FilterExpr::ArrayMethod {
                            property: name.clone(),
                            method: ArrayOp::Contains,
                            argument: Some(argument),
                        });
                    }
                    return Ok(FilterExpr::Compare {
                        property: name.clone(),
                        op: match method {
                            Method::Contains => CompareOp::Contains,
                            Method::StartsWith => CompareOp::StartsWith,
                            Method::EndsWith => CompareOp::EndsWith,
                            _ => unreachable!(),
                        },
                        value: argument,
                    });
                }
                _ => {
                    return Err(Error::unsupported(format!(
                        "method call {} with {} argument(s) on property '{}'",
                        method.name(),
                        args.len(),
                        name
                    )));
                }
            }
        }

        // Constant-collection membership: `values.Contains(p.Field)`.
        if method == Method::Contains && args.len() == 1 {
            if let PredicateNode::Property(name) = &args[0] {
                let values = match constant_value(receiver) {
                    Some(Value::Array(values)) => values,
                    Some(other) => {
                        return Err(Error::unsupported(format!(
                            "Contains receiver of kind {} (expected a constant collection)",
                            other.kind()
                        )));
                    }
                    None => return Err(Error::unsupported(receiver.kind())),
                };
                return Ok(FilterExpr::In {
                    property: name.clone(),
                    values,
                });
            }
        }

        Err(Error::unsupported(format!(
            "method call {} on {}",
            method.name(),
            receiver.kind()
        )))
    }

    /// Extract a property name, special-casing the aggregate accessor shape
    /// `p.Field.Count()` into the synthetic name `Field.Count()` so the
    /// executor can target an aggregate over array rows instead of a scalar
    /// slot.
    fn property_name(&self, node: &PredicateNode) -> Option<String> {
        match node {
            PredicateNode::Property(name) => Some(name.clone()),
            PredicateNode::Call {
                receiver,
                method: Method::Count,
                args,
            } if args.is_empty() => match receiver.as_ref() {
                PredicateNode::Property(name) if self.description.is_array_field(name) => {
                    Some(format!("{}.Count()", name))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn require_array(&self, name: &str, method: &str) -> Result<()> {
        if self.description.is_array_field(name) {
            Ok(())
        } else {
            Err(Error::unsupported(format!(
                "{} on non-array property '{}'",
                method, name
            )))
        }
    }
}

/// Materialize a constant operand, invoking deferred computed constants.
fn constant_value(node: &PredicateNode) -> Option<Value> {
    match node {
        PredicateNode::Constant(v) => Some(v.clone()),
        PredicateNode::Computed(f) => Some(f()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{computed, field, lit};
    use eav_types::{FieldDescriptor, HostType};

    fn person() -> TypeDescription {
        TypeDescription::new("Person")
            .field(FieldDescriptor::new("Name", HostType::String))
            .field(FieldDescriptor::new("Tag", HostType::String).nullable())
            .field(FieldDescriptor::new("Age", HostType::I32))
            .field(FieldDescriptor::new("Active", HostType::Bool))
            .field(FieldDescriptor::new("Tags", HostType::String).array())
    }

    #[test]
    fn and_of_comparisons() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler
            .compile(&field("Age").gt(5).and(field("Name").eq("x")))
            .unwrap();
        assert_eq!(
            expr,
            FilterExpr::and_of(vec![
                FilterExpr::Compare {
                    property: "Age".into(),
                    op: CompareOp::Gt,
                    value: Value::Integer(5),
                },
                FilterExpr::Compare {
                    property: "Name".into(),
                    op: CompareOp::Eq,
                    value: Value::Text("x".into()),
                },
            ])
        );
    }

    #[test]
    fn null_equality_becomes_null_check() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler.compile(&field("Tag").eq(Value::Null)).unwrap();
        assert_eq!(
            expr,
            FilterExpr::IsNull {
                property: "Tag".into(),
                negated: false,
            }
        );
        let expr = compiler.compile(&field("Tag").ne(Value::Null)).unwrap();
        assert_eq!(
            expr,
            FilterExpr::IsNull {
                property: "Tag".into(),
                negated: true,
            }
        );
    }

    #[test]
    fn flipped_constant_side() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler.compile(&lit(5).lt(field("Age"))).unwrap();
        assert_eq!(
            expr,
            FilterExpr::Compare {
                property: "Age".into(),
                op: CompareOp::Gt,
                value: Value::Integer(5),
            }
        );
    }

    #[test]
    fn computed_constants_are_invoked() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler
            .compile(&field("Age").eq(computed(|| Value::Integer(2 + 3))))
            .unwrap();
        assert_eq!(
            expr,
            FilterExpr::Compare {
                property: "Age".into(),
                op: CompareOp::Eq,
                value: Value::Integer(5),
            }
        );
    }

    #[test]
    fn boolean_shorthands() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        assert_eq!(
            compiler.compile(&field("Active")).unwrap(),
            FilterExpr::Compare {
                property: "Active".into(),
                op: CompareOp::Eq,
                value: Value::Boolean(true),
            }
        );
        assert_eq!(
            compiler.compile(&field("Active").negate()).unwrap(),
            FilterExpr::Compare {
                property: "Active".into(),
                op: CompareOp::Eq,
                value: Value::Boolean(false),
            }
        );
    }

    #[test]
    fn bare_boolean_constants() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        assert_eq!(compiler.compile(&lit(true)).unwrap(), FilterExpr::Always(true));
        assert_eq!(
            compiler.compile(&lit(false)).unwrap(),
            FilterExpr::Always(false)
        );
    }

    #[test]
    fn negation_of_subexpression() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler.compile(&field("Age").gt(5).negate()).unwrap();
        assert_eq!(
            expr,
            FilterExpr::not(FilterExpr::Compare {
                property: "Age".into(),
                op: CompareOp::Gt,
                value: Value::Integer(5),
            })
        );
    }

    #[test]
    fn string_predicates() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler.compile(&field("Name").starts_with("ab")).unwrap();
        assert_eq!(
            expr,
            FilterExpr::Compare {
                property: "Name".into(),
                op: CompareOp::StartsWith,
                value: Value::Text("ab".into()),
            }
        );
        // Contains on a scalar string stays a comparison.
        let expr = compiler.compile(&field("Name").contains("x")).unwrap();
        assert!(matches!(
            expr,
            FilterExpr::Compare {
                op: CompareOp::Contains,
                ..
            }
        ));
    }

    #[test]
    fn array_methods_take_priority() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        // Contains on an array-valued property is membership, not substring.
        let expr = compiler.compile(&field("Tags").contains("x")).unwrap();
        assert_eq!(
            expr,
            FilterExpr::ArrayMethod {
                property: "Tags".into(),
                method: ArrayOp::Contains,
                argument: Some(Value::Text("x".into())),
            }
        );
        let expr = compiler.compile(&field("Tags").any()).unwrap();
        assert_eq!(
            expr,
            FilterExpr::ArrayMethod {
                property: "Tags".into(),
                method: ArrayOp::Any,
                argument: None,
            }
        );
    }

    #[test]
    fn count_comparison_uses_synthetic_property() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler.compile(&field("Tags").count().ge(2)).unwrap();
        assert_eq!(
            expr,
            FilterExpr::Compare {
                property: "Tags.Count()".into(),
                op: CompareOp::Ge,
                value: Value::Integer(2),
            }
        );
    }

    #[test]
    fn constant_collection_membership() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let expr = compiler
            .compile(&lit(vec!["a", "b"]).contains(field("Name")))
            .unwrap();
        assert_eq!(
            expr,
            FilterExpr::In {
                property: "Name".into(),
                values: vec![Value::Text("a".into()), Value::Text("b".into())],
            }
        );
    }

    #[test]
    fn unsupported_constructs_are_named() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        // Property-to-property comparison is not compilable.
        let err = compiler
            .compile(&field("Age").gt(field("Age")))
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        // Aggregates over scalar fields are rejected.
        let err = compiler.compile(&field("Name").any()).unwrap_err();
        assert!(err.to_string().contains("non-array"));
    }

    #[test]
    fn depth_guard_rejects_runaway_nesting() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc).with_max_depth(4);
        let mut node = field("Active").eq(true);
        for _ in 0..8 {
            node = node.and(field("Active").eq(true));
        }
        assert!(matches!(
            compiler.compile(&node),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn ordering_selectors() {
        let desc = person();
        let compiler = ExpressionCompiler::new(&desc);
        let ord = compiler
            .compile_ordering(&field("Name"), Direction::Ascending)
            .unwrap();
        assert_eq!(ord.property, "Name");
        let ord = compiler
            .compile_ordering(&field("Tags").count(), Direction::Descending)
            .unwrap();
        assert_eq!(ord.property, "Tags.Count()");
        assert!(compiler
            .compile_ordering(&lit(1), Direction::Ascending)
            .is_err());
    }
}
