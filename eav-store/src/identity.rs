//! Batched identity allocation.
//!
//! The external key source hands out identifiers one round trip at a time;
//! the cache amortizes that by fetching blocks and serving single ids from
//! memory. Gaps left by a dropped cache are acceptable by contract.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use eav_result::{Error, Result};
use eav_types::IdentitySource;

/// Tuning for [`IdentityCache`].
#[derive(Debug, Clone)]
pub struct IdentityCacheConfig {
    /// Ids fetched per source round trip.
    pub batch_size: usize,
}

impl Default for IdentityCacheConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Thread-safe block cache in front of an [`IdentitySource`].
///
/// Single-id requests are served from the cached block; when the block runs
/// low a background-style refill is attempted opportunistically (a failed
/// refill is logged and retried on the next request, never surfaced to the
/// caller that already got an id). Bulk requests bypass the cache entirely
/// so one caller cannot drain the block everyone else shares.
pub struct IdentityCache {
    source: Arc<dyn IdentitySource>,
    pool: Mutex<VecDeque<i64>>,
    refilling: AtomicBool,
    config: IdentityCacheConfig,
}

impl IdentityCache {
    pub fn new(source: Arc<dyn IdentitySource>) -> Self {
        Self::with_config(source, IdentityCacheConfig::default())
    }

    pub fn with_config(source: Arc<dyn IdentitySource>, config: IdentityCacheConfig) -> Self {
        Self {
            source,
            pool: Mutex::new(VecDeque::new()),
            refilling: AtomicBool::new(false),
            config,
        }
    }

    /// Allocate one identifier.
    pub fn next_id(&self) -> Result<i64> {
        if let Some(id) = self.pop_cached()? {
            return Ok(id);
        }

        // Pool was empty; fill synchronously and try again.
        if let Err(err) = self.refill() {
            warn!(error = %err, "identity block fetch failed, falling back to single allocation");
            return self
                .source
                .next_id()
                .map_err(|e| Error::Exhausted(format!("identity source unavailable: {e}")));
        }
        match self.pop_cached()? {
            Some(id) => Ok(id),
            None => self
                .source
                .next_id()
                .map_err(|e| Error::Exhausted(format!("identity source unavailable: {e}"))),
        }
    }

    /// Allocate `count` identifiers, bypassing the shared block.
    ///
    /// Chunked at `batch_size` per source round trip. `count == 1` is
    /// delegated to [`Self::next_id`] so small callers still benefit from
    /// the cache.
    pub fn next_ids(&self, count: usize) -> Result<Vec<i64>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count == 1 {
            return Ok(vec![self.next_id()?]);
        }

        let mut out = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(self.config.batch_size);
            let mut block = self.source.next_ids(take)?;
            if block.is_empty() {
                return Err(Error::Exhausted(
                    "identity source returned an empty block".into(),
                ));
            }
            remaining = remaining.saturating_sub(block.len());
            out.append(&mut block);
        }
        out.truncate(count);
        Ok(out)
    }

    /// Pop one id; opportunistically refill when the pool runs low.
    fn pop_cached(&self) -> Result<Option<i64>> {
        let (id, low) = {
            let mut pool = self
                .pool
                .lock()
                .map_err(|_| Error::Internal("identity pool lock poisoned".into()))?;
            let id = pool.pop_front();
            let low = id.is_some() && pool.len() <= self.config.batch_size / 10;
            (id, low)
        };

        if low && !self.refilling.swap(true, Ordering::AcqRel) {
            let outcome = self.refill();
            self.refilling.store(false, Ordering::Release);
            if let Err(err) = outcome {
                // The caller already has an id; log and let a later call
                // retry the fetch.
                warn!(error = %err, "opportunistic identity refill failed");
            }
        }
        Ok(id)
    }

    fn refill(&self) -> Result<()> {
        let block = self.source.next_ids(self.config.batch_size)?;
        debug!(count = block.len(), "fetched identity block");
        let mut pool = self
            .pool
            .lock()
            .map_err(|_| Error::Internal("identity pool lock poisoned".into()))?;
        pool.extend(block);
        Ok(())
    }
}

/// The cache is itself a valid source, so consumers that only need the
/// [`IdentitySource`] contract can sit in front of it transparently.
impl IdentitySource for IdentityCache {
    fn next_id(&self) -> Result<i64> {
        IdentityCache::next_id(self)
    }

    fn next_ids(&self, count: usize) -> Result<Vec<i64>> {
        IdentityCache::next_ids(self, count)
    }
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
