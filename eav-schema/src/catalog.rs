//! Shared scheme registry with the `ensure_scheme` entry point.
//!
//! The catalog is the in-memory source of truth for scheme metadata. It is
//! thread-safe (`Arc<RwLock<_>>`) and consults the [`MetadataCache`] before
//! touching its own maps, re-populating the cache after any structural
//! change.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use eav_result::{Error, Result};
use eav_types::{IdentitySource, SchemeId, TypeDescription};

use crate::cache::MetadataCache;
use crate::scheme::Scheme;
use crate::sync::{sync_structures, StructureChange};

#[derive(Debug, Default)]
struct CatalogInner {
    name_to_id: FxHashMap<String, SchemeId>,
    schemes: FxHashMap<SchemeId, Scheme>,
}

/// Thread-safe scheme registry.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    inner: Arc<RwLock<CatalogInner>>,
    cache: MetadataCache,
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new(MetadataCache::default())
    }
}

impl SchemaCatalog {
    pub fn new(cache: MetadataCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CatalogInner::default())),
            cache,
        }
    }

    fn cache_key(name: &str) -> String {
        format!("scheme:{}", name)
    }

    /// Create or synchronize the scheme described by `description`.
    ///
    /// A missing scheme is created with one structure per described field;
    /// an existing scheme is diffed (see [`sync_structures`]) with
    /// `strict = false`. Returns the up-to-date scheme.
    pub fn ensure_scheme(
        &self,
        description: &TypeDescription,
        ids: &dyn IdentitySource,
    ) -> Result<Scheme> {
        self.ensure_scheme_with(description, ids, false)
    }

    /// Synchronize structures for an already-described scheme, optionally
    /// deleting structures absent from the description.
    pub fn sync_structures(
        &self,
        description: &TypeDescription,
        ids: &dyn IdentitySource,
        strict: bool,
    ) -> Result<Vec<StructureChange>> {
        let mut scheme = self
            .scheme_by_name(&description.name)
            .ok_or_else(|| Error::not_found(format!("scheme '{}'", description.name)))?;
        let changes = self.run_sync(&mut scheme, description, ids, strict)?;
        if !changes.is_empty() {
            self.store(scheme)?;
        }
        Ok(changes)
    }

    fn ensure_scheme_with(
        &self,
        description: &TypeDescription,
        ids: &dyn IdentitySource,
        strict: bool,
    ) -> Result<Scheme> {
        let mut scheme = match self
            .cache
            .get(&Self::cache_key(&description.name))
            .or_else(|| self.scheme_by_name(&description.name))
        {
            Some(existing) => existing,
            None => {
                let scheme = Scheme {
                    id: ids.next_id()?,
                    name: description.name.clone(),
                    alias: description.alias.clone(),
                    parent_id: description.parent_scheme,
                    structures: Vec::new(),
                };
                tracing::debug!(scheme = %scheme.name, id = scheme.id, "creating scheme");
                scheme
            }
        };

        let changes = self.run_sync(&mut scheme, description, ids, strict)?;
        if !changes.is_empty() {
            tracing::debug!(
                scheme = %scheme.name,
                changes = changes.len(),
                "scheme synchronized"
            );
        }
        self.store(scheme.clone())?;
        Ok(scheme)
    }

    fn run_sync(
        &self,
        scheme: &mut Scheme,
        description: &TypeDescription,
        ids: &dyn IdentitySource,
        strict: bool,
    ) -> Result<Vec<StructureChange>> {
        // Identities are allocated lazily; the diff itself stays pure.
        let mut alloc_err = None;
        let mut next_id = || match ids.next_id() {
            Ok(id) => id,
            Err(e) => {
                alloc_err = Some(e);
                0
            }
        };
        let changes = sync_structures(scheme, description, strict, &mut next_id);
        if let Some(e) = alloc_err {
            return Err(e);
        }
        Ok(changes)
    }

    fn store(&self, scheme: Scheme) -> Result<()> {
        let key = Self::cache_key(&scheme.name);
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Error::internal("catalog write lock poisoned"))?;
        inner.name_to_id.insert(scheme.name.clone(), scheme.id);
        inner.schemes.insert(scheme.id, scheme.clone());
        drop(inner);
        self.cache.set(key, scheme);
        Ok(())
    }

    pub fn scheme_by_name(&self, name: &str) -> Option<Scheme> {
        let inner = self.inner.read().ok()?;
        let id = inner.name_to_id.get(name)?;
        inner.schemes.get(id).cloned()
    }

    pub fn scheme_by_id(&self, id: SchemeId) -> Option<Scheme> {
        let inner = self.inner.read().ok()?;
        inner.schemes.get(&id).cloned()
    }

    /// Drop a scheme from the registry and cache. Returns whether it existed.
    pub fn remove_scheme(&self, name: &str) -> bool {
        let mut inner = match self.inner.write() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        if let Some(id) = inner.name_to_id.remove(name) {
            inner.schemes.remove(&id);
            drop(inner);
            self.cache.invalidate(&Self::cache_key(name));
            true
        } else {
            false
        }
    }

    pub fn scheme_count(&self) -> usize {
        match self.inner.read() {
            Ok(inner) => inner.schemes.len(),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eav_types::{FieldDescriptor, HostType};
    use std::sync::atomic::{AtomicI64, Ordering};

    struct SeqIds(AtomicI64);

    impl IdentitySource for SeqIds {
        fn next_id(&self) -> Result<i64> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst))
        }

        fn next_ids(&self, count: usize) -> Result<Vec<i64>> {
            Ok((0..count).map(|_| self.0.fetch_add(1, Ordering::SeqCst)).collect())
        }
    }

    fn ids() -> SeqIds {
        SeqIds(AtomicI64::new(1))
    }

    fn person() -> TypeDescription {
        TypeDescription::new("Person")
            .field(FieldDescriptor::new("Name", HostType::String))
            .field(FieldDescriptor::new("Age", HostType::I32))
    }

    #[test]
    fn ensure_creates_then_reuses() {
        let catalog = SchemaCatalog::new(MetadataCache::default());
        let ids = ids();

        let first = catalog.ensure_scheme(&person(), &ids).unwrap();
        assert_eq!(first.structures.len(), 2);

        let second = catalog.ensure_scheme(&person(), &ids).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second, first);
        assert_eq!(catalog.scheme_count(), 1);
    }

    #[test]
    fn sync_requires_existing_scheme() {
        let catalog = SchemaCatalog::new(MetadataCache::default());
        let ids = ids();
        assert!(matches!(
            catalog.sync_structures(&person(), &ids, false),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn strict_sync_removes_dropped_fields() {
        let catalog = SchemaCatalog::new(MetadataCache::default());
        let ids = ids();
        catalog.ensure_scheme(&person(), &ids).unwrap();

        let trimmed = TypeDescription::new("Person")
            .field(FieldDescriptor::new("Name", HostType::String));
        let changes = catalog.sync_structures(&trimmed, &ids, true).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], StructureChange::Removed(_)));

        let scheme = catalog.scheme_by_name("Person").unwrap();
        assert!(scheme.structure("Age").is_none());
    }

    #[test]
    fn cache_is_repopulated_after_change() {
        let cache = MetadataCache::default();
        let catalog = SchemaCatalog::new(cache.clone());
        let ids = ids();
        catalog.ensure_scheme(&person(), &ids).unwrap();
        assert!(cache.get("scheme:Person").is_some());

        catalog.remove_scheme("Person");
        assert!(cache.get("scheme:Person").is_none());
    }
}
