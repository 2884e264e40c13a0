//! Logical-expiry read: always answer, rebuild stale entries off the hot path.

use super::CacheStrategy;
use crate::config::CacheConfig;
use crate::entry::{self, CacheEntry};
use crate::keys::{shop_entry_key, shop_lock_key};
use crate::lock::DistributedLock;
use crate::rebuild::{RebuildPool, RebuildTask};
use crate::stats::CacheStats;
use crate::traits::{SharedCache, Store};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use storefront_core::{Result, Shop, ShopId};

/// Read for pre-warmed hot records. Freshness lives inside the payload as a
/// logical expiry; the shared cache never evicts these entries itself.
///
/// A stale hit is still served immediately; at most one rebuild per
/// staleness episode is dispatched, gated by the distributed lock. A pure
/// miss is a definitive not-found with no store fallback: hot keys are
/// populated exclusively by the warming job, so "not cached" means "was
/// never hot". That also removes the penetration concern on this path.
pub struct LogicalExpiryStrategy {
    cache: Arc<dyn SharedCache>,
    store: Arc<dyn Store>,
    lock: DistributedLock,
    pool: Arc<RebuildPool>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl LogicalExpiryStrategy {
    pub fn new(
        cache: Arc<dyn SharedCache>,
        store: Arc<dyn Store>,
        lock: DistributedLock,
        pool: Arc<RebuildPool>,
        config: CacheConfig,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            cache,
            store,
            lock,
            pool,
            config,
            stats,
        }
    }

    /// Try to become the rebuilder for `id`. Losing the lock race means a
    /// rebuild is presumed in flight; a full queue means the episode is
    /// skipped and the next stale read tries again.
    async fn try_dispatch_rebuild(&self, id: ShopId) {
        match self.lock.acquire(&shop_lock_key(id)).await {
            Ok(Some(guard)) => {
                let task = RebuildTask::new(
                    id,
                    guard,
                    Arc::clone(&self.cache),
                    Arc::clone(&self.store),
                    self.config.refresh_window,
                );
                match self.pool.try_dispatch(task) {
                    Ok(()) => self.stats.record_rebuild_dispatched(),
                    Err(task) => {
                        self.stats.record_rebuild_dropped();
                        tracing::warn!(shop_id = id, "rebuild queue full, dropping rebuild");
                        task.abandon().await;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(shop_id = id, error = %e, "could not acquire rebuild lock");
            }
        }
    }
}

#[async_trait]
impl CacheStrategy for LogicalExpiryStrategy {
    async fn read(&self, id: ShopId) -> Result<Option<Shop>> {
        let key = shop_entry_key(id);
        // A shared-cache outage is surfaced as-is: this path has no store
        // fallback by design, whatever the outage policy says.
        let Some(raw) = self.cache.get(&key).await? else {
            self.stats.record_miss();
            return Ok(None);
        };

        let entry = match entry::decode::<Shop>(&key, &raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.stats.record_corrupt_entry();
                tracing::warn!(key, error = %e, "corrupt hot entry treated as not-found");
                return Ok(None);
            }
        };

        match entry {
            CacheEntry::Timed {
                value,
                logical_expire_at,
            } => {
                self.stats.record_hit();
                if Utc::now() >= logical_expire_at {
                    self.try_dispatch_rebuild(id).await;
                }
                // Fresh or stale, the caller gets an immediate answer.
                Ok(Some(value))
            }
            // Entries written by the TTL-backed strategies can show up when
            // a key moves between strategies; serve them as-is.
            CacheEntry::Present { value } => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            CacheEntry::Absent => {
                self.stats.record_negative_hit();
                Ok(None)
            }
        }
    }
}
