//! Hierarchy moves and cycle rejection through the engine.

use std::sync::Arc;

use eav::{
    EavEngine, Error, FieldDescriptor, HostType, ObjectId, ObjectRecord, RowExecutor as _,
    SchemaCatalog, TypeDescription,
};
use eav_test_utils::{init_tracing_for_tests, MemExecutor};

fn setup() -> (Arc<MemExecutor>, EavEngine) {
    init_tracing_for_tests();
    let executor = Arc::new(MemExecutor::new(SchemaCatalog::default()));
    let engine = EavEngine::new(executor.clone(), executor.clone())
        .with_catalog(executor.catalog().clone());
    (executor, engine)
}

fn folder() -> TypeDescription {
    TypeDescription::new("Folder").field(FieldDescriptor::new("Name", HostType::String))
}

/// Chain a -> b -> c (b under a, c under b).
fn chain(engine: &EavEngine, description: &TypeDescription) -> (ObjectId, ObjectId, ObjectId) {
    let scheme = engine.ensure_scheme(description).expect("ensure");
    let save = |name: &str, parent: Option<ObjectId>| {
        let mut record = ObjectRecord::new(scheme.id, 1);
        record.parent_id = parent;
        record.set("Name", name);
        engine.save(&mut record, description, false).expect("save")
    };
    let a = save("a", None);
    let b = save("b", Some(a));
    let c = save("c", Some(b));
    (a, b, c)
}

#[test]
fn moves_within_the_tree_succeed() {
    let (executor, engine) = setup();
    let description = folder();
    let (a, _b, c) = chain(&engine, &description);

    // Hoist c directly under a.
    engine.move_object(c, Some(a), false).expect("move");
    assert_eq!(executor.parent_of(c).expect("parent"), Some(a));

    // Detaching makes it a root.
    engine.move_object(c, None, false).expect("detach");
    assert_eq!(executor.parent_of(c).expect("parent"), None);
}

#[test]
fn moving_under_a_descendant_is_rejected() {
    let (executor, engine) = setup();
    let description = folder();
    let (a, b, c) = chain(&engine, &description);

    let err = engine.move_object(a, Some(c), false).unwrap_err();
    assert!(matches!(err, Error::Cycle(_)));
    let err = engine.move_object(a, Some(b), false).unwrap_err();
    assert!(matches!(err, Error::Cycle(_)));
    let err = engine.move_object(b, Some(b), false).unwrap_err();
    assert!(matches!(err, Error::Cycle(_)));

    // The failed moves leave the tree untouched.
    assert_eq!(executor.parent_of(a).expect("parent"), None);
    assert_eq!(executor.parent_of(b).expect("parent"), Some(a));
    assert_eq!(executor.parent_of(c).expect("parent"), Some(b));
}

#[test]
fn saving_with_a_cyclic_parent_is_rejected() {
    let (_, engine) = setup();
    let description = folder();
    let (a, _b, c) = chain(&engine, &description);

    let mut record = engine.load(a, &description, false).expect("load");
    record.parent_id = Some(c);
    let err = engine.save(&mut record, &description, false).unwrap_err();
    assert!(matches!(err, Error::Cycle(_)));
}

#[test]
fn find_children_reflects_moves() {
    let (executor, engine) = setup();
    let description = folder();
    let (a, b, c) = chain(&engine, &description);

    assert_eq!(executor.find_children(a).expect("children"), vec![b]);
    engine.move_object(c, Some(a), false).expect("move");
    let mut children = executor.find_children(a).expect("children");
    children.sort_unstable();
    assert_eq!(children, vec![b, c]);
}
