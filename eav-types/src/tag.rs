//! Storage type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tag representing the physical storage slot for a structure's values.
///
/// This is a simple, C-like enum that is cheap to store and copy. Its only
/// purpose is to label which typed slot of a value row a structure's data
/// occupies. Every transcode site matches exhaustively over it, so adding a
/// tag forces every read/write path to be revisited by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageTypeTag {
    /// Short text, stored in the text slot.
    Text,
    /// 64-bit signed integer. Narrower host integers widen on write.
    Integer,
    /// 128-bit guid.
    Guid,
    /// 64-bit float. `f32` widens on write.
    Float,
    /// UTC timestamp.
    Timestamp,
    /// Boolean value.
    Boolean,
    /// Opaque byte payload.
    Binary,
    /// Unbounded text, stored separately from the short text slot.
    LongText,
    /// Reference to another object record by id.
    ObjectRef,
    /// Reference to an enumeration list item.
    ListRef,
}

impl StorageTypeTag {
    /// Static name used in error messages and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            StorageTypeTag::Text => "text",
            StorageTypeTag::Integer => "integer",
            StorageTypeTag::Guid => "guid",
            StorageTypeTag::Float => "float",
            StorageTypeTag::Timestamp => "timestamp",
            StorageTypeTag::Boolean => "boolean",
            StorageTypeTag::Binary => "binary",
            StorageTypeTag::LongText => "long-text",
            StorageTypeTag::ObjectRef => "object-ref",
            StorageTypeTag::ListRef => "list-ref",
        }
    }
}

impl fmt::Display for StorageTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
