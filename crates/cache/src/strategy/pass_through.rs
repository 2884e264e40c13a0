//! Cache-aside read with negative caching.

use super::{classify, load_and_populate, CacheStrategy, CachedRead};
use crate::config::{CacheConfig, OnCacheUnavailable};
use crate::keys::shop_entry_key;
use crate::stats::CacheStats;
use crate::traits::{SharedCache, Store};
use async_trait::async_trait;
use std::sync::Arc;
use storefront_core::{Error, Result, Shop, ShopId};

/// The baseline read: consult the cache, fall through to the store on a
/// miss, write the result back. A genuine store miss is cached as a
/// short-lived absent marker so repeated lookups for the same missing id
/// stop at the cache. Concurrent misses on one id all reach the store;
/// use [`super::SingleFlightStrategy`] where that matters.
pub struct PassThroughStrategy {
    cache: Arc<dyn SharedCache>,
    store: Arc<dyn Store>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl PassThroughStrategy {
    pub fn new(
        cache: Arc<dyn SharedCache>,
        store: Arc<dyn Store>,
        config: CacheConfig,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            cache,
            store,
            config,
            stats,
        }
    }

    async fn read_uncached_or_fail(&self, id: ShopId, cause: Error) -> Result<Option<Shop>> {
        match self.config.on_cache_unavailable {
            OnCacheUnavailable::Fail => Err(cause),
            OnCacheUnavailable::FallThrough => {
                tracing::warn!(shop_id = id, error = %cause, "shared cache unavailable, reading store directly");
                self.stats.record_store_load();
                self.store.get_by_id(id).await
            }
        }
    }
}

#[async_trait]
impl CacheStrategy for PassThroughStrategy {
    async fn read(&self, id: ShopId) -> Result<Option<Shop>> {
        let key = shop_entry_key(id);
        match self.cache.get(&key).await {
            Ok(raw) => match classify(&key, raw, &self.stats) {
                CachedRead::Hit(shop) => return Ok(Some(shop)),
                CachedRead::NegativeHit => return Ok(None),
                CachedRead::Miss => {}
            },
            Err(e) => return self.read_uncached_or_fail(id, e).await,
        }

        self.stats.record_miss();
        load_and_populate(
            &*self.cache,
            &*self.store,
            &self.config,
            &self.stats,
            id,
            &key,
        )
        .await
    }
}
