//! Predicate compilation for the EAV query surface.
//!
//! [`ast`] holds the portable [`FilterExpr`]/[`OrderingExpr`] representation
//! handed to the external row executor. [`predicate`] holds the host-side
//! expression tree callers build with the fluent helpers. [`compile`] lowers
//! one into the other.

#![forbid(unsafe_code)]

pub mod ast;
pub mod compile;
pub mod predicate;

pub use ast::{ArrayOp, CompareOp, Direction, FilterExpr, LogicalOp, OrderingExpr};
pub use compile::{ExpressionCompiler, DEFAULT_MAX_LOGICAL_DEPTH};
pub use predicate::{computed, field, lit, PredicateNode};
