//! Fluent query surface and terminal operations.

use rustc_hash::FxHashSet;
use tracing::debug;

use eav_expr::{Direction, ExpressionCompiler, FilterExpr, PredicateNode};
use eav_result::Result;
use eav_store::{PermissionOracle, RowExecutor};
use eav_types::{ObjectId, SchemeId, TypeDescription, UserId};

use crate::context::QueryContext;

/// Composable query over the objects of one scheme.
///
/// Builder steps compile predicates eagerly, so an unsupported expression
/// fails at build time, not at execution. Each step consumes and returns the
/// query; the underlying [`QueryContext`] is never shared between chains.
pub struct ObjectQuery<'a> {
    executor: &'a dyn RowExecutor,
    permissions: &'a dyn PermissionOracle,
    description: &'a TypeDescription,
    context: QueryContext,
}

impl<'a> ObjectQuery<'a> {
    pub fn new(
        executor: &'a dyn RowExecutor,
        permissions: &'a dyn PermissionOracle,
        description: &'a TypeDescription,
        scheme_id: SchemeId,
    ) -> Self {
        Self {
            executor,
            permissions,
            description,
            context: QueryContext::new(scheme_id),
        }
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    // ------------------------------------------------------------------
    // Builder steps
    // ------------------------------------------------------------------

    /// AND a predicate into the query.
    pub fn filter(mut self, predicate: &PredicateNode) -> Result<Self> {
        let compiled = self.compiler().compile(predicate)?;
        self.context.merge_filter(compiled);
        Ok(self)
    }

    /// Append an ascending ordering key.
    pub fn order_by(mut self, selector: &PredicateNode) -> Result<Self> {
        let key = self
            .compiler()
            .compile_ordering(selector, Direction::Ascending)?;
        self.context.ordering.push(key);
        Ok(self)
    }

    /// Append a descending ordering key.
    pub fn order_by_descending(mut self, selector: &PredicateNode) -> Result<Self> {
        let key = self
            .compiler()
            .compile_ordering(selector, Direction::Descending)?;
        self.context.ordering.push(key);
        Ok(self)
    }

    /// Append a secondary ascending ordering key.
    pub fn then_by(self, selector: &PredicateNode) -> Result<Self> {
        self.order_by(selector)
    }

    /// Append a secondary descending ordering key.
    pub fn then_by_descending(self, selector: &PredicateNode) -> Result<Self> {
        self.order_by_descending(selector)
    }

    pub fn take(mut self, limit: u64) -> Self {
        self.context.limit = Some(limit);
        self
    }

    pub fn skip(mut self, offset: u64) -> Self {
        self.context.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.context.distinct = true;
        self
    }

    /// Gate the result set by `user`'s read permission.
    pub fn check_permissions(mut self, user: UserId) -> Self {
        self.context.user_id = Some(user);
        self.context.check_permissions = true;
        self
    }

    /// Restrict results to descendants of one object.
    pub fn with_parent(self, parent: ObjectId) -> Self {
        self.with_parents(vec![parent])
    }

    /// Restrict results to descendants of any of `parents`.
    pub fn with_parents(mut self, parents: Vec<ObjectId>) -> Self {
        self.context.parent_scope = Some(parents);
        self
    }

    /// Bound ancestor-chain walks while applying a parent scope.
    pub fn with_scope_depth(mut self, depth: usize) -> Self {
        self.context.max_scope_depth = depth;
        self
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    /// Execute and return matching object ids in query order.
    pub fn to_list(&self) -> Result<Vec<ObjectId>> {
        self.execute()
    }

    /// Execute and return the first matching id, if any.
    pub fn first(&self) -> Result<Option<ObjectId>> {
        if self.context.provably_empty {
            return Ok(None);
        }
        let mut narrowed = self.context.clone();
        narrowed.limit = Some(1);
        Ok(self.execute_context(&narrowed)?.into_iter().next())
    }

    /// Execute and count matches.
    pub fn count(&self) -> Result<usize> {
        Ok(self.execute()?.len())
    }

    /// Whether any object matches.
    pub fn any(&self) -> Result<bool> {
        Ok(self.first()?.is_some())
    }

    /// Whether every object in the current result set satisfies
    /// `predicate`. Rewritten as the absence of a counterexample.
    pub fn all(&self, predicate: &PredicateNode) -> Result<bool> {
        let compiled = self.compiler().compile(predicate)?;
        let negated = match compiled {
            FilterExpr::Always(b) => FilterExpr::Always(!b),
            other => FilterExpr::not(other),
        };
        let mut counterexample = self.context.clone();
        counterexample.merge_filter(negated);
        counterexample.limit = Some(1);
        counterexample.offset = None;
        Ok(self.execute_context(&counterexample)?.is_empty())
    }

    // ------------------------------------------------------------------

    fn compiler(&self) -> ExpressionCompiler<'_> {
        ExpressionCompiler::new(self.description).with_max_depth(self.context.max_expr_depth)
    }

    fn execute(&self) -> Result<Vec<ObjectId>> {
        self.execute_context(&self.context)
    }

    /// Run one context against the executor, applying permission and scope
    /// post-filters and, when those are active, local pagination.
    fn execute_context(&self, ctx: &QueryContext) -> Result<Vec<ObjectId>> {
        if ctx.provably_empty {
            debug!(scheme_id = ctx.scheme_id, "query is provably empty");
            return Ok(Vec::new());
        }

        let push_down = !ctx.needs_post_filter();
        let mut ids = self.executor.evaluate(
            ctx.scheme_id,
            ctx.filter.as_ref(),
            &ctx.ordering,
            if push_down { ctx.limit } else { None },
            if push_down { ctx.offset } else { None },
            ctx.distinct,
        )?;

        if push_down {
            return Ok(ids);
        }

        if ctx.check_permissions {
            if let Some(user) = ctx.user_id {
                ids.retain(|id| self.permissions.can_read(user, *id));
            }
        }
        if let Some(scope) = &ctx.parent_scope {
            let scope: FxHashSet<ObjectId> = scope.iter().copied().collect();
            let mut kept = Vec::with_capacity(ids.len());
            for id in ids {
                if self.in_scope(id, &scope, ctx.max_scope_depth)? {
                    kept.push(id);
                }
            }
            ids = kept;
        }

        // Pagination over visible objects only.
        let offset = ctx.offset.unwrap_or(0) as usize;
        let mut ids: Vec<ObjectId> = ids.into_iter().skip(offset).collect();
        if let Some(limit) = ctx.limit {
            ids.truncate(limit as usize);
        }
        Ok(ids)
    }

    /// Walk the ancestor chain of `id` up to `max_depth` edges, looking for
    /// a scope member.
    fn in_scope(
        &self,
        id: ObjectId,
        scope: &FxHashSet<ObjectId>,
        max_depth: usize,
    ) -> Result<bool> {
        let mut cursor = self.executor.parent_of(id)?;
        let mut depth = 0;
        while let Some(parent) = cursor {
            if scope.contains(&parent) {
                return Ok(true);
            }
            depth += 1;
            if depth >= max_depth {
                return Ok(false);
            }
            cursor = self.executor.parent_of(parent)?;
        }
        Ok(false)
    }
}
