//! Boundary contracts consumed by the core.
//!
//! All blocking work (row reads/writes, AST evaluation, permission checks)
//! lives behind these traits. The core stays synchronous, side-effect-free
//! computation; implementations decide about transactions, retries, and
//! timeouts.

use eav_expr::{FilterExpr, OrderingExpr};
use eav_result::Result;
use eav_types::{ObjectId, RowId, SchemeId, UserId};

use crate::record::ObjectRecord;
use crate::row::ValueRow;

/// External relational executor over generic attribute rows.
///
/// `evaluate` is the single point where a compiled filter AST is actually
/// executed; its concrete query language is out of the core's scope.
/// `parent_of` exposes the inverse hierarchy edge; traversal operates over
/// ids, never over live object references.
pub trait RowExecutor: Send + Sync {
    fn upsert_value_row(&self, row: &ValueRow) -> Result<()>;
    fn delete_value_row(&self, id: RowId) -> Result<()>;
    fn find_value_rows(&self, object_id: ObjectId) -> Result<Vec<ValueRow>>;

    fn upsert_object(&self, record: &ObjectRecord) -> Result<()>;
    fn find_object(&self, id: ObjectId) -> Result<Option<ObjectRecord>>;
    fn delete_object(&self, id: ObjectId) -> Result<()>;

    fn find_children(&self, parent: ObjectId) -> Result<Vec<ObjectId>>;
    fn parent_of(&self, id: ObjectId) -> Result<Option<ObjectId>>;

    /// Evaluate a compiled filter plus ordering/paging against the rows of
    /// one scheme, returning matching object identifiers.
    fn evaluate(
        &self,
        scheme_id: SchemeId,
        filter: Option<&FilterExpr>,
        ordering: &[OrderingExpr],
        limit: Option<u64>,
        offset: Option<u64>,
        distinct: bool,
    ) -> Result<Vec<ObjectId>>;
}

/// Authorization oracle, consulted only when a call requests it.
pub trait PermissionOracle: Send + Sync {
    fn can_read(&self, user: UserId, object: ObjectId) -> bool;
    fn can_write(&self, user: UserId, object: ObjectId) -> bool;
    fn can_delete(&self, user: UserId, object: ObjectId) -> bool;
}

/// Oracle that allows everything; the default when permission checking is
/// not requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
    fn can_read(&self, _user: UserId, _object: ObjectId) -> bool {
        true
    }

    fn can_write(&self, _user: UserId, _object: ObjectId) -> bool {
        true
    }

    fn can_delete(&self, _user: UserId, _object: ObjectId) -> bool {
        true
    }
}
