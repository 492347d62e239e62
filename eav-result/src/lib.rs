//! Error types and result definitions for the EAV persistence core.
//!
//! This crate provides the unified error type ([`Error`]) and result type
//! alias ([`Result<T>`]) used throughout the `eav-*` crates. All operations
//! that can fail return `Result<T>` and propagate errors with `?`.
//!
//! # Error Categories
//!
//! - **Compile-time failures** ([`Error::Unsupported`]): the predicate
//!   compiler met a construct it does not recognize. Deterministic; never
//!   retried internally.
//! - **Structural integrity** ([`Error::Cycle`], [`Error::Corrupt`],
//!   [`Error::TypeMismatch`]): a re-parenting would loop, the parent chain is
//!   already damaged, or a value's runtime type contradicts its structure's
//!   declared type. Surfaced, never auto-corrected.
//! - **Lookup failures** ([`Error::NotFound`]): missing schemes, structures,
//!   objects, or parents. Caller-actionable and distinct from integrity
//!   violations.
//! - **Authorization** ([`Error::PermissionDenied`]): the permission oracle
//!   refused the requested action; only raised when checking was requested.
//! - **Identity exhaustion** ([`Error::Exhausted`]): the identity source
//!   could not supply a key even after the direct-fetch fallback.
//! - **Catalog errors** ([`Error::CatalogError`]): metadata inconsistency.
//! - **Internal errors** ([`Error::Internal`]): bugs or unexpected states.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
