//! Structural diffing of a scheme against a type description.
//!
//! Pure computation: the caller supplies an identity allocator for new
//! structures and applies persistence itself. Running the same description
//! twice produces no changes on the second run.

use rustc_hash::FxHashSet;

use eav_types::{FieldDescriptor, StructureId, TypeDescription};

use crate::scheme::{Scheme, Structure};
use crate::type_map::{required_for, storage_tag_for};

/// One structural operation emitted by [`sync_structures`].
#[derive(Debug, Clone, PartialEq)]
pub enum StructureChange {
    Added(Structure),
    Updated(Structure),
    Removed(StructureId),
}

/// Diff `scheme` against `description` and apply the result in place.
///
/// For each described field: an existing structure with that name is updated
/// only if its tag, flags, order, or lineage changed; otherwise a new
/// structure is created with an identity from `next_id` and a 1-based order
/// assigned by declaration position. Nested composite fields synchronize
/// recursively as child structures under the qualified name
/// `Parent.Child`. With `strict`, every structure whose name is absent from
/// the description is deleted.
pub fn sync_structures(
    scheme: &mut Scheme,
    description: &TypeDescription,
    strict: bool,
    next_id: &mut dyn FnMut() -> StructureId,
) -> Vec<StructureChange> {
    let mut changes = Vec::new();
    let mut described = FxHashSet::default();

    sync_level(
        scheme,
        &description.fields,
        None,
        "",
        next_id,
        &mut described,
        &mut changes,
    );

    if strict {
        let doomed: Vec<StructureId> = scheme
            .structures
            .iter()
            .filter(|s| !described.contains(&s.name))
            .map(|s| s.id)
            .collect();
        scheme.structures.retain(|s| described.contains(&s.name));
        for id in doomed {
            changes.push(StructureChange::Removed(id));
        }
    }

    changes
}

fn sync_level(
    scheme: &mut Scheme,
    fields: &[FieldDescriptor],
    parent: Option<StructureId>,
    prefix: &str,
    next_id: &mut dyn FnMut() -> StructureId,
    described: &mut FxHashSet<String>,
    changes: &mut Vec<StructureChange>,
) {
    for (position, field) in fields.iter().enumerate() {
        let qualified = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", prefix, field.name)
        };
        described.insert(qualified.clone());

        let tag = storage_tag_for(field.host_type);
        let required = required_for(field);
        let order = (position + 1) as u32;

        let structure_id = match scheme.structures.iter_mut().find(|s| s.name == qualified) {
            Some(existing) => {
                let changed = existing.tag != tag
                    || existing.is_array != field.array
                    || existing.required != required
                    || existing.order != order
                    || existing.parent_id != parent
                    || existing.list_id != field.list_id
                    || existing.store_null != field.store_null;
                if changed {
                    existing.tag = tag;
                    existing.is_array = field.array;
                    existing.required = required;
                    existing.order = order;
                    existing.parent_id = parent;
                    existing.list_id = field.list_id;
                    existing.store_null = field.store_null;
                    changes.push(StructureChange::Updated(existing.clone()));
                }
                existing.id
            }
            None => {
                let structure = Structure {
                    id: next_id(),
                    scheme_id: scheme.id,
                    name: qualified.clone(),
                    tag,
                    is_array: field.array,
                    required,
                    order,
                    parent_id: parent,
                    list_id: field.list_id,
                    store_null: field.store_null,
                };
                let id = structure.id;
                scheme.structures.push(structure.clone());
                changes.push(StructureChange::Added(structure));
                id
            }
        };

        if let Some(nested) = &field.nested {
            sync_level(
                scheme,
                &nested.fields,
                Some(structure_id),
                &qualified,
                next_id,
                described,
                changes,
            );
        }
    }
}
