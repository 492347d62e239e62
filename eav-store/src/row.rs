//! Generic value rows.
//!
//! One row links an object, a structure, and exactly one typed value, or,
//! for relationally-encoded arrays and composites, the correlation
//! bookkeeping that stitches base/anchor rows to their element/child rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eav_result::{Error, Result};
use eav_types::{CorrelationId, ObjectId, RowId, StorageTypeTag, StructureId, Value};

/// One stored attribute instance.
///
/// Invariants maintained by the mapper:
/// - at most one row per (structure, object) when not an array element;
/// - at most one row per (structure, object, array_index) for elements;
/// - an array's base row carries a fresh [`CorrelationId`] and no scalar
///   value; element rows reference it via `array_parent` with `array_index`
///   starting at 0, contiguous, no gaps;
/// - a composite anchor row carries a correlation id; its nested field rows
///   reference it via `array_parent` with no `array_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub id: RowId,
    pub object_id: ObjectId,
    pub structure_id: StructureId,

    pub text: Option<String>,
    pub integer: Option<i64>,
    pub guid: Option<Uuid>,
    pub float: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub boolean: Option<bool>,
    pub binary: Option<Vec<u8>>,
    pub long_text: Option<String>,
    /// JSON fallback slot for opaque payloads (jagged arrays, composites
    /// without backing structures).
    pub serialized: Option<String>,

    /// Correlation id generated for array base rows and composite anchors.
    pub correlation: Option<CorrelationId>,
    /// Correlation of the owning base/anchor row when this row is an array
    /// element or a nested composite field.
    pub array_parent: Option<CorrelationId>,
    /// 0-based position among an array's element rows.
    pub array_index: Option<u32>,
}

impl ValueRow {
    pub fn new(id: RowId, object_id: ObjectId, structure_id: StructureId) -> Self {
        Self {
            id,
            object_id,
            structure_id,
            text: None,
            integer: None,
            guid: None,
            float: None,
            timestamp: None,
            boolean: None,
            binary: None,
            long_text: None,
            serialized: None,
            correlation: None,
            array_parent: None,
            array_index: None,
        }
    }

    /// Clear every typed slot and the correlation, keeping element
    /// bookkeeping (`array_parent`/`array_index`) intact.
    pub fn clear_slots(&mut self) {
        self.text = None;
        self.integer = None;
        self.guid = None;
        self.float = None;
        self.timestamp = None;
        self.boolean = None;
        self.binary = None;
        self.long_text = None;
        self.serialized = None;
        self.correlation = None;
    }

    /// True when every typed slot is empty, the shape of an explicit null
    /// marker and of array base rows.
    pub fn slots_empty(&self) -> bool {
        self.text.is_none()
            && self.integer.is_none()
            && self.guid.is_none()
            && self.float.is_none()
            && self.timestamp.is_none()
            && self.boolean.is_none()
            && self.binary.is_none()
            && self.long_text.is_none()
            && self.serialized.is_none()
    }

    /// Populate exactly the slot matching `tag` from `value`.
    ///
    /// The value must already be in widened form ([`Value`] conversions
    /// upcast narrow integers and `f32` on construction). A runtime kind
    /// that cannot occupy the declared slot is a data-integrity error.
    pub fn set_slot(&mut self, tag: StorageTypeTag, value: &Value, field: &str) -> Result<()> {
        match (tag, value) {
            (StorageTypeTag::Text, Value::Text(s)) => self.text = Some(s.clone()),
            (StorageTypeTag::Integer, Value::Integer(i)) => self.integer = Some(*i),
            (StorageTypeTag::Guid, Value::Guid(g)) => self.guid = Some(*g),
            (StorageTypeTag::Float, Value::Float(f)) => self.float = Some(*f),
            // Integer-to-float widening when the declared slot is wider.
            (StorageTypeTag::Float, Value::Integer(i)) => self.float = Some(*i as f64),
            (StorageTypeTag::Timestamp, Value::Timestamp(t)) => self.timestamp = Some(*t),
            (StorageTypeTag::Boolean, Value::Boolean(b)) => self.boolean = Some(*b),
            (StorageTypeTag::Binary, Value::Binary(bytes)) => self.binary = Some(bytes.clone()),
            (StorageTypeTag::LongText, Value::LongText(s))
            | (StorageTypeTag::LongText, Value::Text(s)) => self.long_text = Some(s.clone()),
            (StorageTypeTag::ObjectRef, Value::Reference(id)) => self.integer = Some(*id),
            (StorageTypeTag::ListRef, Value::ListItem(id)) => self.integer = Some(*id),
            (expected, got) => {
                return Err(Error::TypeMismatch {
                    field: field.to_string(),
                    expected: expected.name(),
                    got: got.kind(),
                });
            }
        }
        Ok(())
    }

    /// Read back the slot matching `tag`, if populated.
    pub fn get_slot(&self, tag: StorageTypeTag) -> Option<Value> {
        match tag {
            StorageTypeTag::Text => self.text.clone().map(Value::Text),
            StorageTypeTag::Integer => self.integer.map(Value::Integer),
            StorageTypeTag::Guid => self.guid.map(Value::Guid),
            StorageTypeTag::Float => self.float.map(Value::Float),
            StorageTypeTag::Timestamp => self.timestamp.map(Value::Timestamp),
            StorageTypeTag::Boolean => self.boolean.map(Value::Boolean),
            StorageTypeTag::Binary => self.binary.clone().map(Value::Binary),
            StorageTypeTag::LongText => self.long_text.clone().map(Value::LongText),
            StorageTypeTag::ObjectRef => self.integer.map(Value::Reference),
            StorageTypeTag::ListRef => self.integer.map(Value::ListItem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trip_per_tag() {
        let mut row = ValueRow::new(1, 10, 100);
        row.set_slot(StorageTypeTag::Integer, &Value::Integer(42), "f")
            .unwrap();
        assert_eq!(row.get_slot(StorageTypeTag::Integer), Some(Value::Integer(42)));

        row.clear_slots();
        assert!(row.slots_empty());

        row.set_slot(StorageTypeTag::ObjectRef, &Value::Reference(7), "f")
            .unwrap();
        assert_eq!(
            row.get_slot(StorageTypeTag::ObjectRef),
            Some(Value::Reference(7))
        );
    }

    #[test]
    fn integer_widens_into_float_slot() {
        let mut row = ValueRow::new(1, 10, 100);
        row.set_slot(StorageTypeTag::Float, &Value::Integer(3), "f")
            .unwrap();
        assert_eq!(row.get_slot(StorageTypeTag::Float), Some(Value::Float(3.0)));
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let mut row = ValueRow::new(1, 10, 100);
        let err = row
            .set_slot(StorageTypeTag::Integer, &Value::Text("x".into()), "Age")
            .unwrap_err();
        match err {
            Error::TypeMismatch {
                field,
                expected,
                got,
            } => {
                assert_eq!(field, "Age");
                assert_eq!(expected, "integer");
                assert_eq!(got, "text");
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }
}
