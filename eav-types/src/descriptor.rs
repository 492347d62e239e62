//! Statically-registered field descriptor tables.
//!
//! Schema synchronization and value transcoding are driven by an explicit
//! per-record-type descriptor table built once at startup, never by runtime
//! type inspection. A [`TypeDescription`] is the ordered list of
//! [`FieldDescriptor`]s for one record shape; it is the sole input to
//! `ensure_scheme` and the authority the expression compiler consults for
//! field shapes.

use serde::{Deserialize, Serialize};

use crate::ids::{ListId, SchemeId};

/// Host-language field type, before mapping to a storage tag.
///
/// Arrays are not host types; array-ness is a flag on the field and the
/// element type drives the stored tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostType {
    String,
    LongString,
    I32,
    I64,
    F32,
    F64,
    Guid,
    Timestamp,
    Bool,
    Bytes,
    /// Reference to another persisted object.
    Reference,
    /// Reference into an enumeration list.
    List,
    /// Nested business object; fields come from a nested description.
    Composite,
}

/// One field of a record type: name, host type, shape flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub host_type: HostType,
    /// Field-level nullability annotation.
    pub nullable: bool,
    /// Array-shaped field; `host_type` describes the element type.
    pub array: bool,
    /// Persist explicit nulls as tombstone rows instead of deleting.
    pub store_null: bool,
    /// Enumeration list backing a `HostType::List` field.
    pub list_id: Option<ListId>,
    /// Nested description for `HostType::Composite` fields (scalar or
    /// array-of-composite).
    pub nested: Option<TypeDescription>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, host_type: HostType) -> Self {
        Self {
            name: name.into(),
            host_type,
            nullable: false,
            array: false,
            store_null: false,
            list_id: None,
            nested: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn store_null(mut self) -> Self {
        self.store_null = true;
        self
    }

    pub fn with_list(mut self, list_id: ListId) -> Self {
        self.list_id = Some(list_id);
        self
    }

    pub fn with_nested(mut self, nested: TypeDescription) -> Self {
        self.nested = Some(nested);
        self
    }
}

/// Ordered field table for one record shape. Declaration order determines
/// structure ordering (1-based, dense) during synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescription {
    /// Target scheme name.
    pub name: String,
    /// Optional alias/namespace carried onto the scheme.
    pub alias: Option<String>,
    /// Optional parent scheme (namespacing only, not field inheritance).
    pub parent_scheme: Option<SchemeId>,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            parent_scheme: None,
            fields: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_parent_scheme(mut self, parent: SchemeId) -> Self {
        self.parent_scheme = Some(parent);
        self
    }

    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Look up a field by name (ordinal comparison).
    pub fn find(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is declared as an array-shaped field.
    pub fn is_array_field(&self, name: &str) -> bool {
        self.find(name).map(|f| f.array).unwrap_or(false)
    }
}
