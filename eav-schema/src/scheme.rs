//! Scheme and structure metadata records.

use serde::{Deserialize, Serialize};

use eav_types::{ListId, SchemeId, StorageTypeTag, StructureId};

/// A named record shape: the EAV analogue of a table definition.
///
/// Owns an ordered collection of structures. Structure names are unique
/// within a scheme (ordinal comparison); [`crate::sync`] maintains the
/// invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: SchemeId,
    pub name: String,
    /// Optional alias/namespace.
    pub alias: Option<String>,
    /// Optional parent scheme, for namespacing only (no field inheritance).
    pub parent_id: Option<SchemeId>,
    pub structures: Vec<Structure>,
}

impl Scheme {
    /// Look up a structure by name (ordinal comparison).
    pub fn structure(&self, name: &str) -> Option<&Structure> {
        self.structures.iter().find(|s| s.name == name)
    }

    /// Look up a structure by id.
    pub fn structure_by_id(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    /// Top-level structures (no parent), in declared order.
    pub fn roots(&self) -> impl Iterator<Item = &Structure> {
        self.structures.iter().filter(|s| s.parent_id.is_none())
    }

    /// Child structures of a composite structure, in declared order.
    pub fn children_of(&self, parent: StructureId) -> impl Iterator<Item = &Structure> {
        self.structures
            .iter()
            .filter(move |s| s.parent_id == Some(parent))
    }
}

/// One field descriptor within a scheme.
///
/// Created, updated, and deleted only through schema synchronization; the
/// read/write paths never mutate structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub scheme_id: SchemeId,
    /// Structure name. Nested composite fields use the qualified form
    /// `Parent.Child` to keep names unique within the scheme.
    pub name: String,
    pub tag: StorageTypeTag,
    pub is_array: bool,
    /// Required (non-nullable) flag derived from the descriptor.
    pub required: bool,
    /// 1-based dense position among siblings, re-numbered on every sync.
    pub order: u32,
    /// Owning composite structure for nested fields.
    pub parent_id: Option<StructureId>,
    /// Enumeration list backing a list-typed structure.
    pub list_id: Option<ListId>,
    /// Persist explicit nulls as tombstone rows instead of deleting.
    pub store_null: bool,
}

impl Structure {
    /// Unqualified field name (the part after the last `.`).
    pub fn field_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}
