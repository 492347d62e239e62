//! Explicit metadata cache service.
//!
//! A process-wide key/value side-channel for scheme metadata, owned by the
//! composition root and passed by handle to every component that needs it.
//! Absence is always safe to treat as "not cached, fetch from the source of
//! truth".
//!
//! The configured `lifetime` is recorded but nothing sweeps expired
//! entries; eviction is explicit via [`MetadataCache::invalidate`]. Callers
//! must invalidate on schema change.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::scheme::Scheme;

/// Cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Nominal entry lifetime. Retained as metadata only; no TTL sweep runs.
    pub lifetime: Option<Duration>,
}

/// Shared, internally synchronized scheme cache.
///
/// Multiple callers may race to populate or invalidate; reads may return a
/// stale entry if an invalidation has not yet been issued.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    inner: Arc<RwLock<FxHashMap<String, Scheme>>>,
    config: CacheConfig,
}

impl MetadataCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(FxHashMap::default())),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fetch a cached scheme. `None` means "not cached".
    pub fn get(&self, key: &str) -> Option<Scheme> {
        let inner = self.inner.read().ok()?;
        inner.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, scheme: Scheme) {
        if let Ok(mut inner) = self.inner.write() {
            inner.insert(key.into(), scheme);
        }
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        match self.inner.write() {
            Ok(mut inner) => inner.remove(key).is_some(),
            Err(_) => false,
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.clear();
        }
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(name: &str) -> Scheme {
        Scheme {
            id: 1,
            name: name.into(),
            alias: None,
            parent_id: None,
            structures: Vec::new(),
        }
    }

    #[test]
    fn get_set_invalidate() {
        let cache = MetadataCache::default();
        assert!(cache.get("scheme:Person").is_none());

        cache.set("scheme:Person", scheme("Person"));
        assert_eq!(cache.get("scheme:Person").unwrap().name, "Person");

        assert!(cache.invalidate("scheme:Person"));
        assert!(!cache.invalidate("scheme:Person"));
        assert!(cache.get("scheme:Person").is_none());
    }

    #[test]
    fn lifetime_is_metadata_only() {
        let cache = MetadataCache::new(CacheConfig {
            lifetime: Some(Duration::from_millis(1)),
        });
        cache.set("k", scheme("Person"));
        std::thread::sleep(Duration::from_millis(5));
        // No sweeper: the entry outlives its nominal lifetime.
        assert!(cache.get("k").is_some());
    }
}
