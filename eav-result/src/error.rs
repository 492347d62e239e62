use std::fmt;
use thiserror::Error;

/// Unified error type for all EAV core operations.
///
/// A single enum rather than crate-specific error types. This simplifies
/// error handling across crate boundaries, lets errors propagate naturally
/// with `?`, and allows structured matching for programmatic handling.
///
/// # Thread Safety
///
/// `Error` implements `Send` and `Sync`, so it can cross thread boundaries;
/// the core components are stateless per call and may be driven from
/// multiple threads concurrently.
#[derive(Error, Debug)]
pub enum Error {
    /// The predicate/ordering compiler encountered a construct it does not
    /// recognize. The message names the offending node kind. Compilation
    /// never silently approximates.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// A requested re-parenting would create a cycle in the object
    /// hierarchy. The message names the object and candidate parent.
    #[error("hierarchy cycle: {0}")]
    Cycle(String),

    /// The ancestor walk revisited a node before reaching a root, meaning
    /// the stored parent chain is already damaged. Distinct from
    /// [`Error::Cycle`] because the corruption pre-dates the request.
    #[error("hierarchy corruption: {0}")]
    Corrupt(String),

    /// A value's runtime type cannot be stored in the slot declared by its
    /// structure. Reported per-field, never silently dropped.
    #[error("type mismatch on field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    /// A referenced scheme, structure, object, or parent does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The permission oracle returned false for the requested action.
    /// Only raised when permission checking was requested for that call.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The identity source could not supply a key, and the direct
    /// single-fetch fallback also failed.
    #[error("identity source exhausted: {0}")]
    Exhausted(String),

    /// Catalog metadata is inconsistent (duplicate names, dangling ids).
    #[error("catalog error: {0}")]
    CatalogError(String),

    /// An internal operation failed. Indicates a bug or unexpected state.
    #[error("an internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported-expression error from any displayable source.
    #[inline]
    pub fn unsupported<E: fmt::Display>(node: E) -> Self {
        Error::Unsupported(node.to_string())
    }

    /// Create a not-found error from any displayable source.
    #[inline]
    pub fn not_found<E: fmt::Display>(what: E) -> Self {
        Error::NotFound(what.to_string())
    }

    /// Create an internal error from any displayable source.
    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
