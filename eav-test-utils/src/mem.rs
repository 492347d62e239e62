//! In-memory [`RowExecutor`] for tests.
//!
//! Stores rows and object metadata in hash maps and evaluates filter ASTs
//! by reconstructing each object's field map through the same transcoding
//! the production write path uses. Doubles as an [`IdentitySource`] and a
//! [`PermissionOracle`] with configurable deny lists, and counts `evaluate`
//! invocations so tests can assert that short-circuiting queries never
//! reach storage.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHashSet};

use eav_expr::{ArrayOp, CompareOp, Direction, FilterExpr, LogicalOp, OrderingExpr};
use eav_result::{Error, Result};
use eav_schema::SchemaCatalog;
use eav_store::{EavValueMapper, ObjectRecord, PermissionOracle, RowExecutor, ValueRow};
use eav_types::{
    FieldValues, IdentitySource, ObjectId, RowId, SchemeId, UserId, Value,
};

#[derive(Default)]
struct MemState {
    rows: FxHashMap<RowId, ValueRow>,
    objects: FxHashMap<ObjectId, ObjectRecord>,
    deny_read: FxHashSet<ObjectId>,
    deny_write: FxHashSet<ObjectId>,
    deny_delete: FxHashSet<ObjectId>,
}

/// Hash-map-backed executor, identity source, and permission oracle.
pub struct MemExecutor {
    state: Mutex<MemState>,
    catalog: SchemaCatalog,
    next_id: AtomicI64,
    evaluate_calls: AtomicUsize,
}

impl MemExecutor {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            catalog,
            next_id: AtomicI64::new(1),
            evaluate_calls: AtomicUsize::new(0),
        }
    }

    /// The catalog this executor resolves schemes against.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// How many times `evaluate` has reached this executor.
    pub fn evaluate_call_count(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }

    pub fn row_count(&self) -> usize {
        self.lock().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn object_count(&self) -> usize {
        self.lock().map(|s| s.objects.len()).unwrap_or(0)
    }

    pub fn deny_read(&self, object: ObjectId) {
        if let Ok(mut state) = self.lock() {
            state.deny_read.insert(object);
        }
    }

    pub fn deny_write(&self, object: ObjectId) {
        if let Ok(mut state) = self.lock() {
            state.deny_write.insert(object);
        }
    }

    pub fn deny_delete(&self, object: ObjectId) {
        if let Ok(mut state) = self.lock() {
            state.deny_delete.insert(object);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemState>> {
        self.state
            .lock()
            .map_err(|_| Error::internal("mem executor lock poisoned"))
    }

    /// Reconstruct the business fields of one stored object.
    fn fields_of(&self, state: &MemState, id: ObjectId, scheme_id: SchemeId) -> Result<FieldValues> {
        let scheme = self
            .catalog
            .scheme_by_id(scheme_id)
            .ok_or_else(|| Error::not_found(format!("scheme {scheme_id}")))?;
        let rows: Vec<ValueRow> = state
            .rows
            .values()
            .filter(|r| r.object_id == id)
            .cloned()
            .collect();
        EavValueMapper::new(&scheme).read_fields(&rows)
    }
}

impl RowExecutor for MemExecutor {
    fn upsert_value_row(&self, row: &ValueRow) -> Result<()> {
        self.lock()?.rows.insert(row.id, row.clone());
        Ok(())
    }

    fn delete_value_row(&self, id: RowId) -> Result<()> {
        self.lock()?.rows.remove(&id);
        Ok(())
    }

    fn find_value_rows(&self, object_id: ObjectId) -> Result<Vec<ValueRow>> {
        let state = self.lock()?;
        let mut rows: Vec<ValueRow> = state
            .rows
            .values()
            .filter(|r| r.object_id == object_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    fn upsert_object(&self, record: &ObjectRecord) -> Result<()> {
        // Business fields live in value rows; only metadata is stored here.
        let mut stored = record.clone();
        stored.fields = FieldValues::new();
        self.lock()?.objects.insert(stored.id, stored);
        Ok(())
    }

    fn find_object(&self, id: ObjectId) -> Result<Option<ObjectRecord>> {
        Ok(self.lock()?.objects.get(&id).cloned())
    }

    fn delete_object(&self, id: ObjectId) -> Result<()> {
        let mut state = self.lock()?;
        state.objects.remove(&id);
        state.rows.retain(|_, r| r.object_id != id);
        Ok(())
    }

    fn find_children(&self, parent: ObjectId) -> Result<Vec<ObjectId>> {
        let state = self.lock()?;
        let mut children: Vec<ObjectId> = state
            .objects
            .values()
            .filter(|o| o.parent_id == Some(parent))
            .map(|o| o.id)
            .collect();
        children.sort_unstable();
        Ok(children)
    }

    fn parent_of(&self, id: ObjectId) -> Result<Option<ObjectId>> {
        Ok(self.lock()?.objects.get(&id).and_then(|o| o.parent_id))
    }

    fn evaluate(
        &self,
        scheme_id: SchemeId,
        filter: Option<&FilterExpr>,
        ordering: &[OrderingExpr],
        limit: Option<u64>,
        offset: Option<u64>,
        distinct: bool,
    ) -> Result<Vec<ObjectId>> {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock()?;

        let mut candidates: Vec<ObjectId> = state
            .objects
            .values()
            .filter(|o| o.scheme_id == scheme_id)
            .map(|o| o.id)
            .collect();
        candidates.sort_unstable();

        let mut matched: Vec<(ObjectId, FieldValues)> = Vec::new();
        for id in candidates {
            let fields = self.fields_of(&state, id, scheme_id)?;
            let keep = match filter {
                Some(expr) => eval_filter(expr, &fields),
                None => true,
            };
            if keep {
                matched.push((id, fields));
            }
        }

        if !ordering.is_empty() {
            matched.sort_by(|(_, a), (_, b)| {
                for key in ordering {
                    let left = property_value(a, &key.property);
                    let right = property_value(b, &key.property);
                    let cmp = value_cmp(left.as_ref(), right.as_ref());
                    let cmp = match key.direction {
                        Direction::Ascending => cmp,
                        Direction::Descending => cmp.reverse(),
                    };
                    if cmp != CmpOrdering::Equal {
                        return cmp;
                    }
                }
                CmpOrdering::Equal
            });
        }

        let mut ids: Vec<ObjectId> = matched.into_iter().map(|(id, _)| id).collect();
        if distinct {
            let mut seen = FxHashSet::default();
            ids.retain(|id| seen.insert(*id));
        }
        if let Some(offset) = offset {
            ids = ids.into_iter().skip(offset as usize).collect();
        }
        if let Some(limit) = limit {
            ids.truncate(limit as usize);
        }
        Ok(ids)
    }
}

impl IdentitySource for MemExecutor {
    fn next_id(&self) -> Result<i64> {
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn next_ids(&self, count: usize) -> Result<Vec<i64>> {
        let start = self.next_id.fetch_add(count as i64, Ordering::SeqCst);
        Ok((start..start + count as i64).collect())
    }
}

impl PermissionOracle for MemExecutor {
    fn can_read(&self, _user: UserId, object: ObjectId) -> bool {
        self.lock()
            .map(|s| !s.deny_read.contains(&object))
            .unwrap_or(false)
    }

    fn can_write(&self, _user: UserId, object: ObjectId) -> bool {
        self.lock()
            .map(|s| !s.deny_write.contains(&object))
            .unwrap_or(false)
    }

    fn can_delete(&self, _user: UserId, object: ObjectId) -> bool {
        self.lock()
            .map(|s| !s.deny_delete.contains(&object))
            .unwrap_or(false)
    }
}

// ----------------------------------------------------------------------
// Filter evaluation over reconstructed field maps
// ----------------------------------------------------------------------

fn eval_filter(expr: &FilterExpr, fields: &FieldValues) -> bool {
    match expr {
        FilterExpr::Always(b) => *b,
        FilterExpr::Compare {
            property,
            op,
            value,
        } => eval_compare(*op, property_value(fields, property).as_ref(), value),
        FilterExpr::Logical { op, operands } => match op {
            LogicalOp::And => operands.iter().all(|e| eval_filter(e, fields)),
            LogicalOp::Or => operands.iter().any(|e| eval_filter(e, fields)),
            LogicalOp::Not => !operands.iter().all(|e| eval_filter(e, fields)),
        },
        FilterExpr::IsNull { property, negated } => {
            let is_null = matches!(
                property_value(fields, property),
                None | Some(Value::Null)
            );
            is_null != *negated
        }
        FilterExpr::In { property, values } => match property_value(fields, property) {
            Some(actual) => values.iter().any(|v| loose_eq(&actual, v)),
            None => false,
        },
        FilterExpr::ArrayMethod {
            property,
            method,
            argument,
        } => {
            let items = match property_value(fields, property) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            match method {
                ArrayOp::Any => !items.is_empty(),
                ArrayOp::Contains => match argument {
                    Some(needle) => items.iter().any(|v| loose_eq(v, needle)),
                    None => false,
                },
                ArrayOp::Count => match argument {
                    Some(expected) => loose_eq(&Value::Integer(items.len() as i64), expected),
                    None => !items.is_empty(),
                },
            }
        }
    }
}

/// Resolve a property name against a field map.
///
/// Supports dotted paths through composites and the synthetic
/// `Field.Count()` aggregate produced by the expression compiler.
fn property_value(fields: &FieldValues, property: &str) -> Option<Value> {
    if let Some(base) = property.strip_suffix(".Count()") {
        return match property_value(fields, base) {
            Some(Value::Array(items)) => Some(Value::Integer(items.len() as i64)),
            Some(Value::Null) | None => Some(Value::Integer(0)),
            _ => None,
        };
    }

    let mut cursor: Option<&Value> = None;
    let mut map = fields;
    let mut parts = property.split('.').peekable();
    while let Some(part) = parts.next() {
        let value = map.get(part)?;
        if parts.peek().is_some() {
            match value {
                Value::Composite(nested) => map = nested,
                _ => return None,
            }
        } else {
            cursor = Some(value);
        }
    }
    cursor.cloned()
}

fn eval_compare(op: CompareOp, actual: Option<&Value>, expected: &Value) -> bool {
    let actual = match actual {
        Some(Value::Null) | None => return false,
        Some(v) => v,
    };
    match op {
        CompareOp::Eq => loose_eq(actual, expected),
        CompareOp::Ne => !loose_eq(actual, expected),
        CompareOp::Gt => value_cmp(Some(actual), Some(expected)) == CmpOrdering::Greater,
        CompareOp::Ge => value_cmp(Some(actual), Some(expected)) != CmpOrdering::Less,
        CompareOp::Lt => value_cmp(Some(actual), Some(expected)) == CmpOrdering::Less,
        CompareOp::Le => value_cmp(Some(actual), Some(expected)) != CmpOrdering::Greater,
        CompareOp::Contains => text_op(actual, expected, |a, b| a.contains(b)),
        CompareOp::StartsWith => text_op(actual, expected, |a, b| a.starts_with(b)),
        CompareOp::EndsWith => text_op(actual, expected, |a, b| a.ends_with(b)),
    }
}

fn text_op(actual: &Value, expected: &Value, f: impl Fn(&str, &str) -> bool) -> bool {
    match (text_of(actual), text_of(expected)) {
        (Some(a), Some(b)) => f(a, b),
        _ => false,
    }
}

fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) | Value::LongText(s) => Some(s),
        _ => None,
    }
}

/// Equality with integer/float and text/long-text cross-kind tolerance.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            *x as f64 == *y
        }
        (Value::Text(x), Value::LongText(y)) | (Value::LongText(x), Value::Text(y)) => x == y,
        _ => a == b,
    }
}

/// Total order over comparable value pairs; incomparable pairs and nulls
/// collate as equal so sorting stays stable.
fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (Some(_), None) => return CmpOrdering::Greater,
        (None, Some(_)) => return CmpOrdering::Less,
        (None, None) => return CmpOrdering::Equal,
    };
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(CmpOrdering::Equal),
        (Value::Integer(x), Value::Float(y)) => {
            (*x as f64).partial_cmp(y).unwrap_or(CmpOrdering::Equal)
        }
        (Value::Float(x), Value::Integer(y)) => {
            x.partial_cmp(&(*y as f64)).unwrap_or(CmpOrdering::Equal)
        }
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::LongText(x), Value::LongText(y)) => x.cmp(y),
        (Value::Text(x), Value::LongText(y)) => x.as_str().cmp(y.as_str()),
        (Value::LongText(x), Value::Text(y)) => x.as_str().cmp(y.as_str()),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Guid(x), Value::Guid(y)) => x.cmp(y),
        (Value::Reference(x), Value::Reference(y)) => x.cmp(y),
        (Value::ListItem(x), Value::ListItem(y)) => x.cmp(y),
        _ => CmpOrdering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_paths_and_synthetic_count() {
        let mut address = FieldValues::new();
        address.insert("City".into(), Value::Text("Oslo".into()));
        let mut fields = FieldValues::new();
        fields.insert("Address".into(), Value::Composite(address));
        fields.insert(
            "Tags".into(),
            Value::Array(vec![Value::Text("a".into()), Value::Text("b".into())]),
        );

        assert_eq!(
            property_value(&fields, "Address.City"),
            Some(Value::Text("Oslo".into()))
        );
        assert_eq!(
            property_value(&fields, "Tags.Count()"),
            Some(Value::Integer(2))
        );
        assert_eq!(property_value(&fields, "Missing"), None);
        assert_eq!(
            property_value(&fields, "Missing.Count()"),
            Some(Value::Integer(0))
        );
    }

    #[test]
    fn comparisons_against_null_are_false() {
        let fields = FieldValues::new();
        let expr = FilterExpr::Compare {
            property: "Age".into(),
            op: CompareOp::Gt,
            value: Value::Integer(1),
        };
        assert!(!eval_filter(&expr, &fields));

        let is_null = FilterExpr::IsNull {
            property: "Age".into(),
            negated: false,
        };
        assert!(eval_filter(&is_null, &fields));
    }

    #[test]
    fn numeric_kinds_compare_across_slots() {
        let mut fields = FieldValues::new();
        fields.insert("Score".into(), Value::Float(3.5));
        let expr = FilterExpr::Compare {
            property: "Score".into(),
            op: CompareOp::Gt,
            value: Value::Integer(3),
        };
        assert!(eval_filter(&expr, &fields));
    }
}
