//! Query building and execution over persisted objects.
//!
//! [`context`] holds the accumulated, immutable query state; [`builder`]
//! layers the fluent surface on top and owns the terminal operations that
//! actually reach the external executor.

#![forbid(unsafe_code)]

pub mod builder;
pub mod context;

pub use builder::ObjectQuery;
pub use context::QueryContext;
