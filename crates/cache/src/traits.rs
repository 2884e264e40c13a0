//! Collaborator traits consumed by the cache layer.
//!
//! Both collaborators are remote, independently concurrent services from the
//! layer's point of view. All mutual exclusion is expressed as keys in the
//! shared cache, so correctness leans entirely on [`SharedCache::set_if_absent`]
//! being atomic.

use async_trait::async_trait;
use std::time::Duration;
use storefront_core::{Result, Shop, ShopCategory, ShopId};

/// A network-accessible key-value service with TTL support.
///
/// `set_if_absent` and `delete_if_value` must be atomic per key; they back
/// the distributed lock. On a redis-like backend `delete_if_value` maps to a
/// compare-and-delete script.
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`; `None` TTL means the entry persists until
    /// explicitly overwritten or deleted.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Atomically store `value` iff `key` is absent. Returns whether the
    /// write happened.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically delete `key` iff its current value equals `expected`.
    /// Returns whether a deletion happened.
    async fn delete_if_value(&self, key: &str, expected: &[u8]) -> Result<bool>;

    /// Reset the TTL of an existing key. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}

/// Durable source of truth, point reads by key.
#[async_trait]
pub trait Store: Send + Sync {
    /// Point lookup. `Ok(None)` is a confirmed absence, not a failure.
    async fn get_by_id(&self, id: ShopId) -> Result<Option<Shop>>;

    /// Persist an updated record. Callers of [`crate::CacheAccess`] must
    /// follow every successful update with cache invalidation; use
    /// [`crate::CacheAccess::update_shop`] which enforces the ordering.
    async fn update(&self, shop: &Shop) -> Result<()>;

    /// The full category list, ordered by `sort` ascending.
    async fn list_categories(&self) -> Result<Vec<ShopCategory>>;
}
