//! The `CacheAccess` facade.

use crate::config::{CacheConfig, OnCacheUnavailable};
use crate::entry::{self, CacheEntry};
use crate::keys::{category_list_key, shop_entry_key};
use crate::lock::DistributedLock;
use crate::rebuild::RebuildPool;
use crate::stats::{CacheStats, StatsSnapshot};
use crate::strategy::{
    CacheStrategy, LogicalExpiryStrategy, PassThroughStrategy, SingleFlightStrategy, StrategyKind,
};
use crate::traits::{SharedCache, Store};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{Error, Result, Shop, ShopCategory, ShopId};

/// Single entry point to the cache layer.
///
/// Owns the collaborators, the distributed lock, the rebuild pool, and one
/// instance of each read strategy. Consumed in-process by the request
/// handling layer; there is no wire protocol of its own.
pub struct CacheAccess {
    cache: Arc<dyn SharedCache>,
    store: Arc<dyn Store>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
    pool: Arc<RebuildPool>,
    pass_through: PassThroughStrategy,
    single_flight: SingleFlightStrategy,
    logical_expiry: LogicalExpiryStrategy,
}

impl CacheAccess {
    /// Build the layer. Validates `config` and spawns the rebuild workers,
    /// so this must run inside a tokio runtime.
    pub fn new(
        cache: Arc<dyn SharedCache>,
        store: Arc<dyn Store>,
        config: CacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        let stats = Arc::new(CacheStats::default());
        let pool = Arc::new(RebuildPool::new(
            config.rebuild_workers,
            config.rebuild_queue_capacity,
        ));
        let lock = DistributedLock::new(Arc::clone(&cache), config.lock_ttl);

        let pass_through = PassThroughStrategy::new(
            Arc::clone(&cache),
            Arc::clone(&store),
            config.clone(),
            Arc::clone(&stats),
        );
        let single_flight = SingleFlightStrategy::new(
            Arc::clone(&cache),
            Arc::clone(&store),
            lock.clone(),
            config.clone(),
            Arc::clone(&stats),
        );
        let logical_expiry = LogicalExpiryStrategy::new(
            Arc::clone(&cache),
            Arc::clone(&store),
            lock,
            Arc::clone(&pool),
            config.clone(),
            Arc::clone(&stats),
        );

        Ok(Self {
            cache,
            store,
            config,
            stats,
            pool,
            pass_through,
            single_flight,
            logical_expiry,
        })
    }

    /// Read a shop by id with the given strategy. `Ok(None)` is a valid
    /// not-found answer; errors are the retryable taxonomy only.
    pub async fn read(&self, id: ShopId, strategy: StrategyKind) -> Result<Option<Shop>> {
        match strategy {
            StrategyKind::PassThrough => self.pass_through.read(id).await,
            StrategyKind::SingleFlight => self.single_flight.read(id).await,
            StrategyKind::LogicalExpiry => self.logical_expiry.read(id).await,
        }
    }

    /// Drop the cached entry for `id`. Idempotent.
    pub async fn invalidate(&self, id: ShopId) -> Result<()> {
        self.cache.delete(&shop_entry_key(id)).await
    }

    /// Persist `shop` and then invalidate its cache entry, in that order.
    /// Write-then-invalidate, never the reverse: a reader racing the update
    /// may cache the old value briefly, but once this returns no read
    /// observes the pre-update record.
    pub async fn update_shop(&self, shop: &Shop) -> Result<()> {
        self.store.update(shop).await?;
        self.invalidate(shop.id).await
    }

    /// Pre-populate the hot entry for `id` with a logical expiry `window`
    /// from now and no physical TTL. Returns whether a record was warmed;
    /// a record missing from the store clears any leftover entry instead.
    pub async fn warm_shop(&self, id: ShopId, window: Duration) -> Result<bool> {
        let key = shop_entry_key(id);
        match self.store.get_by_id(id).await? {
            Some(shop) => {
                let window = chrono::Duration::from_std(window).map_err(|e| {
                    Error::Configuration {
                        message: format!("warm window out of range: {e}"),
                    }
                })?;
                let raw = entry::encode(&key, &CacheEntry::timed(shop, Utc::now() + window))?;
                self.cache.set(&key, raw, None).await?;
                Ok(true)
            }
            None => {
                tracing::warn!(shop_id = id, "asked to warm a record the store does not have");
                self.cache.delete(&key).await?;
                Ok(false)
            }
        }
    }

    /// The category list, cache-aside under a single well-known key. The
    /// list is small and read-mostly, so the whole thing is one entry with
    /// the positive TTL; an empty store result is served but not cached.
    pub async fn list_categories(&self) -> Result<Vec<ShopCategory>> {
        let key = category_list_key();
        match self.cache.get(key).await {
            Ok(Some(raw)) => match entry::decode::<Vec<ShopCategory>>(key, &raw) {
                Ok(CacheEntry::Present { value }) => {
                    self.stats.record_hit();
                    return Ok(value);
                }
                Ok(_) => {}
                Err(e) => {
                    self.stats.record_corrupt_entry();
                    tracing::warn!(key, error = %e, "corrupt category list treated as miss");
                }
            },
            Ok(None) => {}
            Err(e) => {
                if self.config.on_cache_unavailable == OnCacheUnavailable::Fail {
                    return Err(e);
                }
                tracing::warn!(error = %e, "shared cache unavailable, reading categories from store");
            }
        }

        self.stats.record_miss();
        self.stats.record_store_load();
        let categories = self.store.list_categories().await?;
        if !categories.is_empty() {
            let raw = entry::encode(key, &CacheEntry::present(categories.clone()))?;
            if let Err(e) = self
                .cache
                .set(key, raw, Some(self.config.positive_ttl))
                .await
            {
                tracing::warn!(key, error = %e, "failed to cache category list");
            }
        }
        Ok(categories)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Rebuilds queued but not yet running.
    pub fn rebuild_queue_depth(&self) -> usize {
        self.pool.queue_depth()
    }

    /// Stop the rebuild workers, waiting for in-flight rebuilds to finish.
    pub async fn shutdown(self) {
        let Self {
            pool,
            pass_through,
            single_flight,
            logical_expiry,
            ..
        } = self;
        // The logical-expiry strategy holds the only other pool reference.
        drop(pass_through);
        drop(single_flight);
        drop(logical_expiry);
        match Arc::try_unwrap(pool) {
            Ok(pool) => pool.shutdown().await,
            Err(_) => tracing::warn!("rebuild pool still referenced elsewhere, not waiting"),
        }
    }
}

impl std::fmt::Debug for CacheAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAccess")
            .field("config", &self.config)
            .field("rebuild_queue_depth", &self.pool.queue_depth())
            .finish()
    }
}
