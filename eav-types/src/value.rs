//! Literal values carried by record fields.
//!
//! A [`Value`] is the runtime payload of one business field before it has
//! been placed into a storage slot. Type inference against the structure's
//! [`StorageTypeTag`](crate::tag::StorageTypeTag) happens at transcode time,
//! so a `Value` deliberately carries more shapes (arrays, composites,
//! explicit null) than any single slot can hold.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::ids::{ListId, ObjectId};

/// Ordered business-field map of a record. `BTreeMap` keeps field
/// enumeration deterministic regardless of insertion order.
pub type FieldValues = BTreeMap<String, Value>;

/// A literal value that has not yet been placed into a storage slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Explicit null. Whether this persists as a tombstone row or deletes
    /// the row is decided by the structure's store-null policy.
    Null,
    Text(String),
    Integer(i64),
    Guid(Uuid),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    Binary(Vec<u8>),
    LongText(String),
    /// Reference to another object record.
    Reference(ObjectId),
    /// Reference to an enumeration list item.
    ListItem(ListId),
    /// Array-shaped field; encoded relationally as one base row plus one
    /// element row per member.
    Array(Vec<Value>),
    /// Nested composite (non-primitive business object); encoded as sibling
    /// rows anchored to a correlation id.
    Composite(FieldValues),
}

macro_rules! impl_from_for_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

// Numeric widening: narrow integers and f32 upcast to the 64-bit slots.
impl_from_for_value!(Integer, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_value!(Float, f32, f64);
impl_from_for_value!(Boolean, bool);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(v: Vec<V>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl Value {
    /// Static name of the variant, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Guid(_) => "guid",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Boolean(_) => "boolean",
            Value::Binary(_) => "binary",
            Value::LongText(_) => "long-text",
            Value::Reference(_) => "object-ref",
            Value::ListItem(_) => "list-ref",
            Value::Array(_) => "array",
            Value::Composite(_) => "composite",
        }
    }

    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Deterministic string rendering used by the content hash.
    ///
    /// Arrays render as `[a,b,...]`, composites as `{k=v;...}` with keys in
    /// map order (already sorted), timestamps as RFC 3339 with fixed
    /// precision. The rendering is stable across runs and platforms.
    pub fn stringify(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) | Value::LongText(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Guid(g) => g.to_string(),
            Value::Float(f) => {
                // `{:?}` keeps the shortest round-trippable form.
                format!("{:?}", f)
            }
            Value::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::Micros, true),
            Value::Boolean(b) => b.to_string(),
            Value::Binary(bytes) => bytes.iter().map(|b| format!("{:02x}", b)).collect(),
            Value::Reference(id) => id.to_string(),
            Value::ListItem(id) => id.to_string(),
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(Value::stringify).collect();
                format!("[{}]", inner.join(","))
            }
            Value::Composite(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.stringify()))
                    .collect();
                format!("{{{}}}", inner.join(";"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_conversions() {
        assert_eq!(Value::from(7i32), Value::Integer(7));
        assert_eq!(Value::from(7u16), Value::Integer(7));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(Value::from("x"), Value::Text("x".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn stringify_is_deterministic() {
        let mut fields = FieldValues::new();
        fields.insert("b".into(), Value::Integer(2));
        fields.insert("a".into(), Value::Text("x".into()));
        let v = Value::Composite(fields);
        assert_eq!(v.stringify(), "{a=x;b=2}");

        let arr = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(arr.stringify(), "[1,2]");
    }
}
