//! Save/load round-trips through the engine and the in-memory executor.

use std::sync::Arc;

use eav::{
    EavEngine, FieldDescriptor, FieldValues, HostType, ObjectRecord, RowExecutor as _,
    SchemaCatalog, TypeDescription, Value,
};
use eav_test_utils::{init_tracing_for_tests, MemExecutor};

fn setup() -> (Arc<MemExecutor>, EavEngine) {
    init_tracing_for_tests();
    let executor = Arc::new(MemExecutor::new(SchemaCatalog::default()));
    let engine = EavEngine::new(executor.clone(), executor.clone())
        .with_catalog(executor.catalog().clone());
    (executor, engine)
}

fn person() -> TypeDescription {
    TypeDescription::new("Person")
        .field(FieldDescriptor::new("Name", HostType::String))
        .field(FieldDescriptor::new("Age", HostType::I32).nullable())
        .field(
            FieldDescriptor::new("Note", HostType::String)
                .nullable()
                .store_null(),
        )
        .field(FieldDescriptor::new("Tags", HostType::String).array())
        .field(
            FieldDescriptor::new("Address", HostType::Composite).with_nested(
                TypeDescription::new("Address")
                    .field(FieldDescriptor::new("City", HostType::String))
                    .field(FieldDescriptor::new("Zip", HostType::String)),
            ),
        )
}

#[test]
fn scalar_round_trip_assigns_identity_and_hash() {
    let (_, engine) = setup();
    let description = person();
    let scheme = engine.ensure_scheme(&description).expect("ensure scheme");

    let mut record = ObjectRecord::new(scheme.id, 1);
    record.set("Name", "Ada").set("Age", 36);
    assert!(record.is_new());

    let id = engine.save(&mut record, &description, false).expect("save");
    assert!(id > 0);
    assert!(!record.is_new());
    assert!(record.content_hash.is_some());

    let loaded = engine.load(id, &description, false).expect("load");
    assert_eq!(loaded.get("Name"), Some(&Value::Text("Ada".into())));
    assert_eq!(loaded.get("Age"), Some(&Value::Integer(36)));
    assert_eq!(loaded.content_hash, record.content_hash);

    // A second save keeps the identity stable.
    let mut reloaded = loaded;
    reloaded.set("Age", 37);
    let second = engine
        .save(&mut reloaded, &description, false)
        .expect("second save");
    assert_eq!(second, id);
    assert_ne!(reloaded.content_hash, record.content_hash);
}

#[test]
fn array_fields_pack_as_base_plus_contiguous_elements() {
    let (executor, engine) = setup();
    let description = person();
    let scheme = engine.ensure_scheme(&description).expect("ensure scheme");

    let mut record = ObjectRecord::new(scheme.id, 1);
    record.set(
        "Tags",
        vec![
            Value::Text("red".into()),
            Value::Text("green".into()),
            Value::Text("blue".into()),
        ],
    );
    let id = engine.save(&mut record, &description, false).expect("save");

    let tags = scheme.structure("Tags").expect("Tags structure");
    let rows = executor.find_value_rows(id).expect("rows");
    let base: Vec<_> = rows
        .iter()
        .filter(|r| r.structure_id == tags.id && r.array_parent.is_none())
        .collect();
    assert_eq!(base.len(), 1);
    assert!(base[0].slots_empty());
    let corr = base[0].correlation.expect("correlation");

    let mut indexes: Vec<u32> = rows
        .iter()
        .filter(|r| r.array_parent == Some(corr))
        .filter_map(|r| r.array_index)
        .collect();
    indexes.sort_unstable();
    assert_eq!(indexes, vec![0, 1, 2]);

    let loaded = engine.load(id, &description, false).expect("load");
    assert_eq!(
        loaded.get("Tags"),
        Some(&Value::Array(vec![
            Value::Text("red".into()),
            Value::Text("green".into()),
            Value::Text("blue".into()),
        ]))
    );
}

#[test]
fn null_policy_controls_tombstones() {
    let (executor, engine) = setup();
    let description = person();
    let scheme = engine.ensure_scheme(&description).expect("ensure scheme");

    let mut record = ObjectRecord::new(scheme.id, 1);
    record.set("Age", 30).set("Note", "temporary");
    let id = engine.save(&mut record, &description, false).expect("save");

    record.set("Age", Value::Null);
    record.set("Note", Value::Null);
    engine
        .save(&mut record, &description, false)
        .expect("save nulls");

    let rows = executor.find_value_rows(id).expect("rows");
    let age = scheme.structure("Age").expect("Age");
    let note = scheme.structure("Note").expect("Note");
    assert!(!rows.iter().any(|r| r.structure_id == age.id));
    let marker = rows
        .iter()
        .find(|r| r.structure_id == note.id)
        .expect("tombstone");
    assert!(marker.slots_empty());

    let loaded = engine.load(id, &description, false).expect("load");
    assert!(loaded.get("Age").is_none());
    assert_eq!(loaded.get("Note"), Some(&Value::Null));
}

#[test]
fn composite_round_trip() {
    let (_, engine) = setup();
    let description = person();
    let scheme = engine.ensure_scheme(&description).expect("ensure scheme");

    let mut address = FieldValues::new();
    address.insert("City".into(), Value::Text("Bergen".into()));
    address.insert("Zip".into(), Value::Text("5003".into()));

    let mut record = ObjectRecord::new(scheme.id, 1);
    record.set("Name", "Kari");
    record.set("Address", Value::Composite(address.clone()));
    let id = engine.save(&mut record, &description, false).expect("save");

    let loaded = engine.load(id, &description, false).expect("load");
    assert_eq!(loaded.get("Address"), Some(&Value::Composite(address)));
}

#[test]
fn delete_removes_rows_and_detaches_children() {
    let (executor, engine) = setup();
    let description = person();
    let scheme = engine.ensure_scheme(&description).expect("ensure scheme");

    let mut parent = ObjectRecord::new(scheme.id, 1);
    parent.set("Name", "root");
    let parent_id = engine
        .save(&mut parent, &description, false)
        .expect("save parent");

    let mut child = ObjectRecord::new(scheme.id, 1);
    child.parent_id = Some(parent_id);
    child.set("Name", "leaf");
    let child_id = engine
        .save(&mut child, &description, false)
        .expect("save child");

    engine.delete(parent_id, false).expect("delete");

    assert!(executor.find_object(parent_id).expect("lookup").is_none());
    assert!(executor.find_value_rows(parent_id).expect("rows").is_empty());
    let orphan = engine.load(child_id, &description, false).expect("child");
    assert_eq!(orphan.parent_id, None);
}

#[test]
fn permission_checks_guard_each_operation() {
    let (executor, engine) = setup();
    let engine = engine.with_permissions(executor.clone()).with_user(7);
    let description = person();
    let scheme = engine.ensure_scheme(&description).expect("ensure scheme");

    let mut record = ObjectRecord::new(scheme.id, 7);
    record.set("Name", "secret");
    let id = engine.save(&mut record, &description, true).expect("save");

    executor.deny_read(id);
    let err = engine.load(id, &description, true).unwrap_err();
    assert!(matches!(err, eav::Error::PermissionDenied(_)));
    // Unchecked access still works.
    assert!(engine.load(id, &description, false).is_ok());

    executor.deny_write(id);
    let err = engine.save(&mut record, &description, true).unwrap_err();
    assert!(matches!(err, eav::Error::PermissionDenied(_)));

    executor.deny_delete(id);
    let err = engine.delete(id, true).unwrap_err();
    assert!(matches!(err, eav::Error::PermissionDenied(_)));
}
