//! Engine orchestration: save, load, delete, move, query.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use eav_query::ObjectQuery;
use eav_result::{Error, Result};
use eav_schema::{SchemaCatalog, Scheme, StructureChange};
use eav_store::{
    content_hash, validate_new_parent, AllowAll, EavValueMapper, IdentityCache,
    IdentityCacheConfig, ObjectRecord, PermissionOracle, RowExecutor,
};
use eav_types::{IdentitySource, ObjectId, TypeDescription, UserId};

/// Persistence engine over an external row executor.
///
/// The engine owns no storage. It looks schemes up in the catalog, runs the
/// value mapper to reconcile rows, stamps timestamps and content hashes,
/// and hands compiled queries to the executor. Schema synchronization is a
/// separate, explicit step ([`Self::ensure_scheme`]); saving never mutates
/// schema metadata.
pub struct EavEngine {
    executor: Arc<dyn RowExecutor>,
    identity: IdentityCache,
    permissions: Arc<dyn PermissionOracle>,
    catalog: SchemaCatalog,
    user: UserId,
}

impl EavEngine {
    pub fn new(executor: Arc<dyn RowExecutor>, identity: Arc<dyn IdentitySource>) -> Self {
        Self {
            executor,
            identity: IdentityCache::new(identity),
            permissions: Arc::new(AllowAll),
            catalog: SchemaCatalog::default(),
            user: 0,
        }
    }

    /// Replace the default allow-all permission oracle.
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionOracle>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Share an existing schema catalog instead of the fresh default.
    pub fn with_catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the acting user stamped on writes and checked by permissions.
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user = user;
        self
    }

    /// Tune identity block fetching.
    pub fn with_identity_config(
        mut self,
        source: Arc<dyn IdentitySource>,
        config: IdentityCacheConfig,
    ) -> Self {
        self.identity = IdentityCache::with_config(source, config);
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    /// Create or diff the scheme backing `description`.
    pub fn ensure_scheme(&self, description: &TypeDescription) -> Result<Scheme> {
        self.catalog.ensure_scheme(description, &self.identity)
    }

    /// Re-synchronize an existing scheme, optionally deleting structures
    /// absent from the description.
    pub fn sync_structures(
        &self,
        description: &TypeDescription,
        strict: bool,
    ) -> Result<Vec<StructureChange>> {
        self.catalog
            .sync_structures(description, &self.identity, strict)
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Persist `record`, assigning an identity on first save.
    ///
    /// Stamps `modified_at` and the content hash, validates the parent edge
    /// when one is set, and reconciles value rows through the mapper. The
    /// record's scheme must already exist (see [`Self::ensure_scheme`]).
    pub fn save(
        &self,
        record: &mut ObjectRecord,
        description: &TypeDescription,
        check_permissions: bool,
    ) -> Result<ObjectId> {
        let scheme = self.scheme_for(description)?;
        if record.is_new() {
            record.scheme_id = scheme.id;
        } else if record.scheme_id != scheme.id {
            return Err(Error::CatalogError(format!(
                "record belongs to scheme {} but '{}' is scheme {}",
                record.scheme_id, scheme.name, scheme.id
            )));
        }

        if check_permissions && !record.is_new() && !self.permissions.can_write(self.user, record.id)
        {
            return Err(Error::PermissionDenied(format!(
                "user {} may not write object {}",
                self.user, record.id
            )));
        }

        if record.parent_id.is_some() {
            let executor = Arc::clone(&self.executor);
            validate_new_parent(record.id, record.parent_id, &move |id| {
                executor.parent_of(id)
            })?;
        }

        let was_new = record.is_new();
        if was_new {
            record.id = self.identity.next_id()?;
            record.created_at = Utc::now();
        }
        record.modified_at = Utc::now();
        record.content_hash = content_hash(&record.fields);

        let existing = if was_new {
            Vec::new()
        } else {
            self.executor.find_value_rows(record.id)?
        };
        let mapper = EavValueMapper::new(&scheme);
        let plan = mapper.plan_write(record, &existing, &self.identity)?;

        self.executor.upsert_object(record)?;
        for id in &plan.deletes {
            self.executor.delete_value_row(*id)?;
        }
        for row in &plan.upserts {
            self.executor.upsert_value_row(row)?;
        }
        debug!(
            object_id = record.id,
            scheme = %scheme.name,
            new = was_new,
            "object saved"
        );
        Ok(record.id)
    }

    /// Load one object with its business fields reconstructed.
    pub fn load(
        &self,
        id: ObjectId,
        description: &TypeDescription,
        check_permissions: bool,
    ) -> Result<ObjectRecord> {
        let scheme = self.scheme_for(description)?;
        let mut record = self
            .executor
            .find_object(id)?
            .ok_or_else(|| Error::not_found(format!("object {id}")))?;
        if check_permissions && !self.permissions.can_read(self.user, id) {
            return Err(Error::PermissionDenied(format!(
                "user {} may not read object {id}",
                self.user
            )));
        }
        let rows = self.executor.find_value_rows(id)?;
        record.fields = EavValueMapper::new(&scheme).read_fields(&rows)?;
        Ok(record)
    }

    /// Delete one object and its value rows. Children are detached, not
    /// deleted.
    pub fn delete(&self, id: ObjectId, check_permissions: bool) -> Result<()> {
        let record = self
            .executor
            .find_object(id)?
            .ok_or_else(|| Error::not_found(format!("object {id}")))?;
        if check_permissions && !self.permissions.can_delete(self.user, id) {
            return Err(Error::PermissionDenied(format!(
                "user {} may not delete object {id}",
                self.user
            )));
        }

        for child in self.executor.find_children(id)? {
            if let Some(mut orphan) = self.executor.find_object(child)? {
                orphan.parent_id = None;
                orphan.modified_at = Utc::now();
                self.executor.upsert_object(&orphan)?;
            }
        }
        for row in self.executor.find_value_rows(id)? {
            self.executor.delete_value_row(row.id)?;
        }
        self.executor.delete_object(id)?;
        debug!(object_id = id, scheme_id = record.scheme_id, "object deleted");
        Ok(())
    }

    /// Re-parent one object, rejecting moves that would create a cycle.
    pub fn move_object(
        &self,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        check_permissions: bool,
    ) -> Result<()> {
        let mut record = self
            .executor
            .find_object(id)?
            .ok_or_else(|| Error::not_found(format!("object {id}")))?;
        if check_permissions && !self.permissions.can_write(self.user, id) {
            return Err(Error::PermissionDenied(format!(
                "user {} may not move object {id}",
                self.user
            )));
        }

        let executor = Arc::clone(&self.executor);
        validate_new_parent(id, new_parent, &move |i| executor.parent_of(i))?;

        record.parent_id = new_parent;
        record.modified_at = Utc::now();
        self.executor.upsert_object(&record)?;
        debug!(object_id = id, parent = ?new_parent, "object moved");
        Ok(())
    }

    /// Start a query over the objects of `description`'s scheme.
    pub fn query<'a>(&'a self, description: &'a TypeDescription) -> Result<ObjectQuery<'a>> {
        let scheme = self.scheme_for(description)?;
        Ok(ObjectQuery::new(
            self.executor.as_ref(),
            self.permissions.as_ref(),
            description,
            scheme.id,
        ))
    }

    fn scheme_for(&self, description: &TypeDescription) -> Result<Scheme> {
        self.catalog
            .scheme_by_name(&description.name)
            .ok_or_else(|| Error::not_found(format!("scheme '{}'", description.name)))
    }
}
