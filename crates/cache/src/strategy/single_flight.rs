//! Single-flight read: one loader per cold key, bounded spin for the rest.

use super::{classify, load_and_populate, CacheStrategy, CachedRead};
use crate::config::{CacheConfig, OnCacheUnavailable};
use crate::keys::{shop_entry_key, shop_lock_key};
use crate::lock::DistributedLock;
use crate::stats::CacheStats;
use crate::traits::{SharedCache, Store};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_core::{Error, Result, Shop, ShopId};

/// Cache-aside read where, on a miss, only the distributed-lock holder
/// queries the store. Every other concurrent reader sleeps and re-checks
/// the cache, up to `max_spins` times; exhausting the budget fails with
/// [`Error::Busy`] rather than falling back to an uncached store read,
/// which would defeat the protection. Store load for one cold key is O(1)
/// regardless of reader fan-in. No fairness among waiters: the winner is
/// whoever's set-if-absent lands first.
pub struct SingleFlightStrategy {
    cache: Arc<dyn SharedCache>,
    store: Arc<dyn Store>,
    lock: DistributedLock,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl SingleFlightStrategy {
    pub fn new(
        cache: Arc<dyn SharedCache>,
        store: Arc<dyn Store>,
        lock: DistributedLock,
        config: CacheConfig,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            cache,
            store,
            lock,
            config,
            stats,
        }
    }

    fn spin_sleep(&self) -> Duration {
        let base = self.config.spin_delay;
        if self.config.spin_jitter {
            // Up to +25% keeps waiters from re-checking in lockstep.
            let span = (base.as_millis() as u64 / 4).max(1);
            base + Duration::from_millis(fastrand::u64(0..=span))
        } else {
            base
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
impl CacheStrategy for SingleFlightStrategy {
    async fn read(&self, id: ShopId) -> Result<Option<Shop>> {
        let key = shop_entry_key(id);
        let lock_key = shop_lock_key(id);
        let started = Instant::now();
        let mut recorded_miss = false;
        let mut remaining = self.config.max_spins;

        loop {
            // Re-check the cache first on every pass: another flight may
            // have populated it while we slept.
            match self.cache.get(&key).await {
                Ok(raw) => match classify(&key, raw, &self.stats) {
                    CachedRead::Hit(shop) => return Ok(Some(shop)),
                    CachedRead::NegativeHit => return Ok(None),
                    CachedRead::Miss => {}
                },
                Err(e) => return self.read_uncached_or_fail(id, e).await,
            }
            if !recorded_miss {
                self.stats.record_miss();
                recorded_miss = true;
            }

            match self.lock.acquire(&lock_key).await {
                Ok(Some(guard)) => {
                    let loaded = load_and_populate(
                        &*self.cache,
                        &*self.store,
                        &self.config,
                        &self.stats,
                        id,
                        &key,
                    )
                    .await;
                    // Release on every path, store errors included.
                    guard.release().await;
                    return loaded;
                }
                Ok(None) => {}
                Err(e) => return self.read_uncached_or_fail(id, e).await,
            }

            if remaining == 0 {
                self.stats.record_busy_timeout();
                return Err(Error::Busy {
                    key,
                    waited: started.elapsed(),
                });
            }
            remaining -= 1;
            // Cancellation point: a dropped caller stops spinning here.
            tokio::time::sleep(self.spin_sleep()).await;
        }
    }
}
