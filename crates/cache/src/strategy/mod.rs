//! Read strategies.
//!
//! One record type, three ways to read it, selected by configuration rather
//! than code edits. All strategies share the entry codec and key namespaces;
//! they differ only in how a miss or a stale entry falls through to the
//! store.

mod logical_expiry;
mod pass_through;
mod single_flight;

pub use logical_expiry::LogicalExpiryStrategy;
pub use pass_through::PassThroughStrategy;
pub use single_flight::SingleFlightStrategy;

use crate::config::CacheConfig;
use crate::entry::{self, CacheEntry};
use crate::stats::CacheStats;
use crate::traits::{SharedCache, Store};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use storefront_core::{Result, Shop, ShopId};

/// Which read recipe to apply for a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Cache-aside with negative caching; no stampede protection. The
    /// baseline, acceptable only for low-contention keys.
    PassThrough,
    /// On a miss only the lock holder queries the store; other readers spin
    /// on the cache, bounded, and fail `Busy` rather than stampede.
    SingleFlight,
    /// Serve the cached value even when logically stale and rebuild in the
    /// background. Only for pre-warmed hot records.
    LogicalExpiry,
}

/// The read contract every strategy implements.
///
/// `Ok(None)` is a valid not-found result (negative-cached or confirmed
/// absent), never an error.
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    async fn read(&self, id: ShopId) -> Result<Option<Shop>>;
}

/// Outcome of consulting the shared cache on the TTL-backed read paths.
pub(crate) enum CachedRead {
    Hit(Shop),
    NegativeHit,
    Miss,
}

/// Interpret raw cache bytes for the TTL-backed strategies. Corrupt entries
/// count as misses (fail open toward a store read); a logically stale timed
/// entry left over from a warming run also counts as a miss so it gets
/// replaced by a regular TTL entry.
pub(crate) fn classify(key: &str, raw: Option<Vec<u8>>, stats: &CacheStats) -> CachedRead {
    let Some(raw) = raw else {
        return CachedRead::Miss;
    };
    match entry::decode::<Shop>(key, &raw) {
        Ok(CacheEntry::Present { value }) => {
            stats.record_hit();
            CachedRead::Hit(value)
        }
        Ok(CacheEntry::Absent) => {
            stats.record_negative_hit();
            CachedRead::NegativeHit
        }
        Ok(CacheEntry::Timed {
            value,
            logical_expire_at,
        }) => {
            if Utc::now() < logical_expire_at {
                stats.record_hit();
                CachedRead::Hit(value)
            } else {
                CachedRead::Miss
            }
        }
        Err(e) => {
            stats.record_corrupt_entry();
            tracing::warn!(key, error = %e, "corrupt cache entry treated as miss");
            CachedRead::Miss
        }
    }
}

/// Point-look up the store for `id` and write the result back under `key`:
/// a present entry with the positive TTL, or an absent marker with the
/// (shorter) negative TTL. A failed write-back is logged, not surfaced; the
/// caller still gets the loaded value.
pub(crate) async fn load_and_populate(
    cache: &dyn SharedCache,
    store: &dyn Store,
    config: &CacheConfig,
    stats: &CacheStats,
    id: ShopId,
    key: &str,
) -> Result<Option<Shop>> {
    stats.record_store_load();
    match store.get_by_id(id).await? {
        Some(shop) => {
            let raw = entry::encode(key, &CacheEntry::present(shop.clone()))?;
            if let Err(e) = cache.set(key, raw, Some(config.positive_ttl)).await {
                tracing::warn!(key, error = %e, "failed to populate cache after store hit");
            }
            Ok(Some(shop))
        }
        None => {
            let raw = entry::encode(key, &CacheEntry::<Shop>::absent())?;
            if let Err(e) = cache.set(key, raw, Some(config.negative_ttl)).await {
                tracing::warn!(key, error = %e, "failed to write absent marker");
            }
            Ok(None)
        }
    }
}
