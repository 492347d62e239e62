//! Accumulated query state.

use serde::{Deserialize, Serialize};

use eav_expr::{FilterExpr, OrderingExpr, DEFAULT_MAX_LOGICAL_DEPTH};
use eav_types::{ObjectId, SchemeId, UserId};

/// Default bound on ancestor-chain traversal when a parent scope is set.
pub const DEFAULT_MAX_SCOPE_DEPTH: usize = 32;

/// Immutable snapshot of everything a query has accumulated.
///
/// Builder steps clone and extend; no step mutates a context another query
/// may still hold. `provably_empty` is set the moment a constant-false
/// predicate is merged in, and terminal operations short-circuit on it
/// without reaching the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub scheme_id: SchemeId,
    /// User whose permissions gate the result set, when checking is on.
    pub user_id: Option<UserId>,
    pub check_permissions: bool,
    /// Restrict results to descendants of these objects.
    pub parent_scope: Option<Vec<ObjectId>>,
    /// Bound on ancestor-chain walks while applying the parent scope.
    pub max_scope_depth: usize,
    pub filter: Option<FilterExpr>,
    pub ordering: Vec<OrderingExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
    /// A merged predicate was constant-false; the result set is empty
    /// regardless of stored data.
    pub provably_empty: bool,
    /// Bound handed to the expression compiler for nested logicals.
    pub max_expr_depth: usize,
}

impl QueryContext {
    pub fn new(scheme_id: SchemeId) -> Self {
        Self {
            scheme_id,
            user_id: None,
            check_permissions: false,
            parent_scope: None,
            max_scope_depth: DEFAULT_MAX_SCOPE_DEPTH,
            filter: None,
            ordering: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            provably_empty: false,
            max_expr_depth: DEFAULT_MAX_LOGICAL_DEPTH,
        }
    }

    /// Merge a compiled predicate into the accumulated filter with AND.
    ///
    /// Constant-true merges are dropped; a constant-false merge flips
    /// `provably_empty` instead of growing the tree.
    pub fn merge_filter(&mut self, compiled: FilterExpr) {
        match compiled {
            FilterExpr::Always(true) => {}
            FilterExpr::Always(false) => self.provably_empty = true,
            other => {
                self.filter = Some(match self.filter.take() {
                    Some(existing) => FilterExpr::and_of(vec![existing, other]),
                    None => other,
                });
            }
        }
    }

    /// Whether results need per-id post-processing after the executor runs.
    ///
    /// When true, limit/offset cannot be pushed down; they are applied after
    /// filtering so pagination counts visible objects only.
    pub fn needs_post_filter(&self) -> bool {
        self.check_permissions || self.parent_scope.is_some()
    }
}
