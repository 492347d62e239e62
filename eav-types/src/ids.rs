//! Identifiers shared across EAV crates.
//!
//! All persistent identities are plain `i64` aliases handed out by the
//! external monotonic identity source. Correlation ids for array/composite
//! encoding are [`uuid::Uuid`] values generated locally per write.

/// Unique identifier for an object record (entity instance).
///
/// Assigned from the external identity source on first save and never
/// reused. Id `0` is not a valid object id; use `Option<ObjectId>` for
/// absent parents.
pub type ObjectId = i64;

/// Unique identifier for a scheme (record shape).
pub type SchemeId = i64;

/// Unique identifier for a structure (field descriptor) within a scheme.
pub type StructureId = i64;

/// Unique identifier for a stored value row.
pub type RowId = i64;

/// Identifier of an acting user (owner/modifier identity).
pub type UserId = i64;

/// Identifier of an enumeration list referenced by list-typed structures.
pub type ListId = i64;

/// Correlation identifier linking an array's base row to its element rows,
/// or a composite field's anchor row to its nested sibling rows.
///
/// Generated fresh (v4) on every array/composite re-emission; element rows
/// reference it through `ValueRow::array_parent`.
pub type CorrelationId = uuid::Uuid;
