//! Object records (entity instances).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eav_types::{FieldValues, ObjectId, SchemeId, UserId, Value};

/// One entity instance: lineage metadata plus its business-field map.
///
/// The identity is assigned from the external key source on first save
/// (`id == 0` marks an unsaved record); the record is mutated in place
/// thereafter. The content hash covers only `fields`, never identity,
/// parent, owner, or timestamp metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    /// Hierarchy edge. Must never create a cycle; enforced on every
    /// re-parenting.
    pub parent_id: Option<ObjectId>,
    pub scheme_id: SchemeId,
    pub owner_id: UserId,
    pub modified_by: UserId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Optional validity window.
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    /// Optional secondary codes.
    pub code_int: Option<i64>,
    pub code_text: Option<String>,
    pub code_guid: Option<Uuid>,
    pub display_name: String,
    pub note: Option<String>,
    pub flag: bool,
    pub content_hash: Option<Uuid>,
    /// Business fields; the only part covered by the content hash.
    pub fields: FieldValues,
}

impl ObjectRecord {
    /// New unsaved record owned by `owner`.
    pub fn new(scheme_id: SchemeId, owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            parent_id: None,
            scheme_id,
            owner_id: owner,
            modified_by: owner,
            created_at: now,
            modified_at: now,
            valid_from: None,
            valid_until: None,
            code_int: None,
            code_text: None,
            code_guid: None,
            display_name: String::new(),
            note: None,
            flag: false,
            content_hash: None,
            fields: FieldValues::new(),
        }
    }

    /// True until the first save assigns an identity.
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    /// Set one business field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Read one business field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
