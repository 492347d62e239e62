//! Transcoding between typed records and generic value rows.
//!
//! The mapper is pure planning: it takes the current row set of an object
//! and the desired field map, and produces the upserts and deletes that
//! reconcile them. Applying the plan is the executor's job, which keeps the
//! transcoding logic testable without any storage behind it.
//!
//! Row shapes produced here:
//! - plain scalar: one row per field, slot chosen by the structure's tag,
//!   reused in place across saves;
//! - explicit null with `store_null`: one tombstone row with every slot
//!   cleared;
//! - array: one base row carrying a fresh correlation id and no value, plus
//!   one element row per item with `array_parent` set to that correlation
//!   and `array_index` 0..n contiguous;
//! - composite: one anchor row carrying a correlation id, plus one row per
//!   nested field with `array_parent` set to the anchor's correlation and
//!   no index;
//! - jagged arrays and composites without backing structures fall back to a
//!   JSON payload in the `serialized` slot.
//!
//! Arrays and composites are rewritten wholesale on every save; scalar rows
//! are the only ones updated in place. Rows for structures the scheme no
//! longer knows are ignored on read and untouched on write.

use rustc_hash::FxHashSet;
use tracing::debug;
use uuid::Uuid;

use eav_result::{Error, Result};
use eav_schema::{Scheme, Structure};
use eav_types::{CorrelationId, FieldValues, IdentitySource, ObjectId, RowId, StructureId, Value};

use crate::record::ObjectRecord;
use crate::row::ValueRow;

/// Reconciliation plan for one object's rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPlan {
    pub upserts: Vec<ValueRow>,
    pub deletes: Vec<RowId>,
}

impl RowPlan {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Scheme-driven transcoder between [`ObjectRecord`] field maps and
/// [`ValueRow`] sets.
pub struct EavValueMapper<'a> {
    scheme: &'a Scheme,
}

impl<'a> EavValueMapper<'a> {
    pub fn new(scheme: &'a Scheme) -> Self {
        Self { scheme }
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Plan the row changes that make `existing` reflect `record.fields`.
    ///
    /// The record is treated as the full desired state: a root field absent
    /// from the map is planned as null. Fields in the map with no matching
    /// structure are silently skipped.
    pub fn plan_write(
        &self,
        record: &ObjectRecord,
        existing: &[ValueRow],
        ids: &dyn IdentitySource,
    ) -> Result<RowPlan> {
        let mut plan = RowPlan::default();
        for structure in self.scheme.roots() {
            let subtree = self.subtree_ids(structure.id);
            let rows: Vec<&ValueRow> = existing
                .iter()
                .filter(|r| subtree.contains(&r.structure_id))
                .collect();
            let value = record.fields.get(&structure.name);
            self.plan_field(&mut plan, structure, value, &rows, record.id, ids)?;
        }
        debug!(
            object_id = record.id,
            upserts = plan.upserts.len(),
            deletes = plan.deletes.len(),
            "planned row reconciliation"
        );
        Ok(plan)
    }

    fn plan_field(
        &self,
        plan: &mut RowPlan,
        structure: &Structure,
        value: Option<&Value>,
        rows: &[&ValueRow],
        object_id: ObjectId,
        ids: &dyn IdentitySource,
    ) -> Result<()> {
        match value {
            None | Some(Value::Null) => self.plan_null(plan, structure, rows, object_id, ids),
            Some(value) if structure.is_array => {
                let items = match value {
                    Value::Array(items) => items,
                    other => {
                        return Err(Error::TypeMismatch {
                            field: structure.name.clone(),
                            expected: "array",
                            got: other.kind(),
                        });
                    }
                };
                plan.deletes.extend(rows.iter().map(|r| r.id));
                self.emit_array(plan, structure, items, object_id, None, ids)
            }
            Some(value) if self.has_children(structure.id) => {
                let map = match value {
                    Value::Composite(map) => map,
                    other => {
                        return Err(Error::TypeMismatch {
                            field: structure.name.clone(),
                            expected: "composite",
                            got: other.kind(),
                        });
                    }
                };
                plan.deletes.extend(rows.iter().map(|r| r.id));
                self.emit_composite(plan, structure, map, object_id, None, ids)
            }
            Some(value) => self.plan_scalar(plan, structure, value, rows, object_id, ids),
        }
    }

    /// Null handling: tombstone when the structure stores nulls, otherwise
    /// remove every row of the subtree.
    fn plan_null(
        &self,
        plan: &mut RowPlan,
        structure: &Structure,
        rows: &[&ValueRow],
        object_id: ObjectId,
        ids: &dyn IdentitySource,
    ) -> Result<()> {
        if !structure.store_null {
            plan.deletes.extend(rows.iter().map(|r| r.id));
            return Ok(());
        }

        let anchor = rows
            .iter()
            .find(|r| r.structure_id == structure.id && r.array_parent.is_none());
        match anchor {
            Some(found) => {
                let mut tombstone = (*found).clone();
                tombstone.clear_slots();
                tombstone.array_index = None;
                plan.deletes
                    .extend(rows.iter().filter(|r| r.id != found.id).map(|r| r.id));
                plan.upserts.push(tombstone);
            }
            None => {
                plan.deletes.extend(rows.iter().map(|r| r.id));
                plan.upserts
                    .push(ValueRow::new(ids.next_id()?, object_id, structure.id));
            }
        }
        Ok(())
    }

    /// Scalar rows are updated in place; stray extra rows are removed.
    fn plan_scalar(
        &self,
        plan: &mut RowPlan,
        structure: &Structure,
        value: &Value,
        rows: &[&ValueRow],
        object_id: ObjectId,
        ids: &dyn IdentitySource,
    ) -> Result<()> {
        let reusable = rows
            .iter()
            .find(|r| r.structure_id == structure.id && r.array_parent.is_none());
        let mut row = match reusable {
            Some(found) => {
                plan.deletes
                    .extend(rows.iter().filter(|r| r.id != found.id).map(|r| r.id));
                (*found).clone()
            }
            None => {
                plan.deletes.extend(rows.iter().map(|r| r.id));
                ValueRow::new(ids.next_id()?, object_id, structure.id)
            }
        };
        row.clear_slots();
        self.fill_slot(&mut row, structure, value)?;
        plan.upserts.push(row);
        Ok(())
    }

    fn emit_array(
        &self,
        plan: &mut RowPlan,
        structure: &Structure,
        items: &[Value],
        object_id: ObjectId,
        parent: Option<CorrelationId>,
        ids: &dyn IdentitySource,
    ) -> Result<()> {
        let corr = Uuid::new_v4();
        let mut base = ValueRow::new(ids.next_id()?, object_id, structure.id);
        base.correlation = Some(corr);
        base.array_parent = parent;
        plan.upserts.push(base);

        for (index, item) in items.iter().enumerate() {
            let mut row = ValueRow::new(ids.next_id()?, object_id, structure.id);
            row.array_parent = Some(corr);
            row.array_index = Some(index as u32);
            match item {
                Value::Null => {}
                Value::Composite(map) if self.has_children(structure.id) => {
                    let element_corr = Uuid::new_v4();
                    row.correlation = Some(element_corr);
                    plan.upserts.push(row);
                    self.emit_children(plan, structure, map, object_id, element_corr, ids)?;
                    continue;
                }
                other => self.fill_slot(&mut row, structure, other)?,
            }
            plan.upserts.push(row);
        }
        Ok(())
    }

    fn emit_composite(
        &self,
        plan: &mut RowPlan,
        structure: &Structure,
        map: &FieldValues,
        object_id: ObjectId,
        parent: Option<CorrelationId>,
        ids: &dyn IdentitySource,
    ) -> Result<()> {
        let corr = Uuid::new_v4();
        let mut anchor = ValueRow::new(ids.next_id()?, object_id, structure.id);
        anchor.correlation = Some(corr);
        anchor.array_parent = parent;
        plan.upserts.push(anchor);
        self.emit_children(plan, structure, map, object_id, corr, ids)
    }

    fn emit_children(
        &self,
        plan: &mut RowPlan,
        structure: &Structure,
        map: &FieldValues,
        object_id: ObjectId,
        corr: CorrelationId,
        ids: &dyn IdentitySource,
    ) -> Result<()> {
        for child in self.scheme.children_of(structure.id) {
            let value = map.get(child.field_name());
            match value {
                None | Some(Value::Null) => {
                    if child.store_null {
                        let mut tombstone =
                            ValueRow::new(ids.next_id()?, object_id, child.id);
                        tombstone.array_parent = Some(corr);
                        plan.upserts.push(tombstone);
                    }
                }
                Some(value) if child.is_array => {
                    let items = match value {
                        Value::Array(items) => items,
                        other => {
                            return Err(Error::TypeMismatch {
                                field: child.name.clone(),
                                expected: "array",
                                got: other.kind(),
                            });
                        }
                    };
                    self.emit_array(plan, child, items, object_id, Some(corr), ids)?;
                }
                Some(Value::Composite(nested)) if self.has_children(child.id) => {
                    self.emit_composite(plan, child, nested, object_id, Some(corr), ids)?;
                }
                Some(value) => {
                    let mut row = ValueRow::new(ids.next_id()?, object_id, child.id);
                    row.array_parent = Some(corr);
                    self.fill_slot(&mut row, child, value)?;
                    plan.upserts.push(row);
                }
            }
        }
        Ok(())
    }

    /// Place `value` into the row: the declared slot for ordinary values,
    /// the JSON fallback for shapes the slot model cannot hold.
    fn fill_slot(&self, row: &mut ValueRow, structure: &Structure, value: &Value) -> Result<()> {
        match value {
            Value::Array(_) | Value::Composite(_) => {
                row.serialized = Some(serde_json::to_string(value).map_err(|e| {
                    Error::Internal(format!(
                        "failed to serialize fallback payload for {}: {e}",
                        structure.name
                    ))
                })?);
                Ok(())
            }
            other => row.set_slot(structure.tag, other, &structure.name),
        }
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Reconstruct a field map from an object's rows.
    ///
    /// The dual of [`Self::plan_write`]: tombstone rows surface as explicit
    /// [`Value::Null`], missing rows leave the field absent, and rows for
    /// structures the scheme does not know are skipped.
    pub fn read_fields(&self, rows: &[ValueRow]) -> Result<FieldValues> {
        let mut fields = FieldValues::new();
        for structure in self.scheme.roots() {
            if let Some(value) = self.read_field(structure, rows, None)? {
                fields.insert(structure.name.clone(), value);
            }
        }
        Ok(fields)
    }

    fn read_field(
        &self,
        structure: &Structure,
        rows: &[ValueRow],
        parent: Option<CorrelationId>,
    ) -> Result<Option<Value>> {
        let anchor = rows.iter().find(|r| {
            r.structure_id == structure.id && r.array_parent == parent && r.array_index.is_none()
        });
        let anchor = match anchor {
            Some(row) => row,
            None => return Ok(None),
        };

        if structure.is_array {
            let corr = match anchor.correlation {
                Some(corr) => corr,
                // A base row without a correlation is a null tombstone.
                None => return Ok(Some(Value::Null)),
            };
            let mut elements: Vec<&ValueRow> = rows
                .iter()
                .filter(|r| {
                    r.structure_id == structure.id
                        && r.array_parent == Some(corr)
                        && r.array_index.is_some()
                })
                .collect();
            elements.sort_by_key(|r| r.array_index);
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                items.push(self.read_element(structure, element, rows)?);
            }
            return Ok(Some(Value::Array(items)));
        }

        if self.has_children(structure.id) {
            let corr = match anchor.correlation {
                Some(corr) => corr,
                None => return Ok(Some(Value::Null)),
            };
            return Ok(Some(self.read_composite(structure, rows, corr)?));
        }

        Ok(Some(self.read_slot(structure, anchor)?))
    }

    fn read_element(
        &self,
        structure: &Structure,
        element: &ValueRow,
        rows: &[ValueRow],
    ) -> Result<Value> {
        if let Some(corr) = element.correlation {
            if self.has_children(structure.id) {
                return self.read_composite(structure, rows, corr);
            }
        }
        self.read_slot(structure, element)
    }

    fn read_composite(
        &self,
        structure: &Structure,
        rows: &[ValueRow],
        corr: CorrelationId,
    ) -> Result<Value> {
        let mut map = FieldValues::new();
        for child in self.scheme.children_of(structure.id) {
            if let Some(value) = self.read_field(child, rows, Some(corr))? {
                map.insert(child.field_name().to_string(), value);
            }
        }
        Ok(Value::Composite(map))
    }

    fn read_slot(&self, structure: &Structure, row: &ValueRow) -> Result<Value> {
        if let Some(payload) = &row.serialized {
            return serde_json::from_str(payload).map_err(|e| {
                Error::Corrupt(format!(
                    "unreadable fallback payload for {}: {e}",
                    structure.name
                ))
            });
        }
        Ok(row.get_slot(structure.tag).unwrap_or(Value::Null))
    }

    // ------------------------------------------------------------------

    fn has_children(&self, id: StructureId) -> bool {
        self.scheme.children_of(id).next().is_some()
    }

    /// Structure ids of `root` and every nested descendant.
    fn subtree_ids(&self, root: StructureId) -> FxHashSet<StructureId> {
        let mut out = FxHashSet::default();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if out.insert(id) {
                stack.extend(self.scheme.children_of(id).map(|c| c.id));
            }
        }
        out
    }
}
