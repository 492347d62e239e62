//! Table-driven host type to storage tag mapping.

use eav_types::{FieldDescriptor, HostType, StorageTypeTag};

/// Map a host field type to its storage slot tag.
///
/// Collections are detected structurally by the caller; the element type
/// drives the stored tag and the field itself is marked array. Composite
/// fields anchor their nested rows through a correlation id, so they occupy
/// the guid slot.
pub fn storage_tag_for(host: HostType) -> StorageTypeTag {
    match host {
        HostType::String => StorageTypeTag::Text,
        HostType::LongString => StorageTypeTag::LongText,
        HostType::I32 | HostType::I64 => StorageTypeTag::Integer,
        HostType::F32 | HostType::F64 => StorageTypeTag::Float,
        HostType::Guid => StorageTypeTag::Guid,
        HostType::Timestamp => StorageTypeTag::Timestamp,
        HostType::Bool => StorageTypeTag::Boolean,
        HostType::Bytes => StorageTypeTag::Binary,
        HostType::Reference => StorageTypeTag::ObjectRef,
        HostType::List => StorageTypeTag::ListRef,
        HostType::Composite => StorageTypeTag::Guid,
    }
}

/// Derive the required flag for a field.
///
/// Array absence is represented by zero element rows, not a null marker, so
/// array fields are never required. Otherwise the field's own nullability
/// annotation decides, for reference-like and value-like host types alike:
/// the descriptor carries an explicit flag either way, so no per-kind rule
/// is needed.
pub fn required_for(field: &FieldDescriptor) -> bool {
    if field.array {
        return false;
    }
    !field.nullable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_mapping_is_total() {
        assert_eq!(storage_tag_for(HostType::I32), StorageTypeTag::Integer);
        assert_eq!(storage_tag_for(HostType::F32), StorageTypeTag::Float);
        assert_eq!(storage_tag_for(HostType::Composite), StorageTypeTag::Guid);
        assert_eq!(storage_tag_for(HostType::List), StorageTypeTag::ListRef);
    }

    #[test]
    fn arrays_are_never_required() {
        let f = FieldDescriptor::new("Tags", HostType::String).array();
        assert!(!required_for(&f));
        let f = FieldDescriptor::new("Age", HostType::I32);
        assert!(required_for(&f));
        let f = FieldDescriptor::new("Note", HostType::String).nullable();
        assert!(!required_for(&f));
    }

    #[test]
    fn annotation_decides_for_every_host_kind() {
        // Reference-like and value-like fields follow the same explicit flag.
        assert!(required_for(&FieldDescriptor::new("Serial", HostType::String)));
        assert!(required_for(&FieldDescriptor::new("Count", HostType::I64)));
        assert!(!required_for(
            &FieldDescriptor::new("Owner", HostType::Reference).nullable()
        ));
        assert!(!required_for(
            &FieldDescriptor::new("Seen", HostType::Timestamp).nullable()
        ));
    }
}
