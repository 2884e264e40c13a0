//! In-process shared-cache backend.

use crate::traits::SharedCache;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use storefront_core::{Error, Result};

/// One stored value with its physical expiry.
#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    /// `None` means the value persists until overwritten or deleted.
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }
}

/// DashMap-backed [`SharedCache`] with lazy physical-TTL expiry.
///
/// Expired values are dropped on the next touch of their key rather than by
/// a sweeper; the read strategies only ever observe live entries. The
/// per-key atomicity of `set_if_absent` and `delete_if_value` comes from the
/// DashMap entry API holding the shard lock across the check and the write.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, StoredValue>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a shared-cache outage; every operation fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remaining physical TTL of a live key. `Some(None)` means the key
    /// persists indefinitely; `None` means the key is absent or expired.
    pub fn remaining_ttl(&self, key: &str) -> Option<Option<Duration>> {
        let value = self.entries.get(key)?;
        if value.is_expired() {
            return None;
        }
        Some(
            value
                .expires_at
                .map(|at| at.saturating_duration_since(Instant::now())),
        )
    }

    fn check_available(&self, operation: &'static str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::cache_unavailable(operation, "backend marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_available("get")?;
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                if occupied.get().is_expired() {
                    occupied.remove();
                    Ok(None)
                } else {
                    Ok(Some(occupied.get().data.clone()))
                }
            }
            Entry::Vacant(_) => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.check_available("set")?;
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        self.check_available("set_if_absent")?;
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoredValue::new(value, Some(ttl)));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(value, Some(ttl)));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_available("delete")?;
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_if_value(&self, key: &str, expected: &[u8]) -> Result<bool> {
        self.check_available("delete_if_value")?;
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                if occupied.get().is_expired() {
                    occupied.remove();
                    Ok(false)
                } else if occupied.get().data == expected {
                    occupied.remove();
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.check_available("expire")?;
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.remove();
                    Ok(false)
                } else {
                    occupied.get_mut().expires_at = Some(Instant::now() + ttl);
                    Ok(true)
                }
            }
            Entry::Vacant(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() -> Result<()> {
        let cache = MemoryCache::new();
        cache.set("k", b"v".to_vec(), None).await?;
        assert_eq!(cache.get("k").await?, Some(b"v".to_vec()));
        assert_eq!(cache.get("missing").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn physical_ttl_expires_values() -> Result<()> {
        let cache = MemoryCache::new();
        cache
            .set("k", b"v".to_vec(), Some(Duration::from_millis(30)))
            .await?;
        assert!(cache.get("k").await?.is_some());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn set_if_absent_is_exclusive_until_expiry() -> Result<()> {
        let cache = MemoryCache::new();
        assert!(
            cache
                .set_if_absent("k", b"a".to_vec(), Duration::from_millis(30))
                .await?
        );
        assert!(
            !cache
                .set_if_absent("k", b"b".to_vec(), Duration::from_secs(5))
                .await?
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(
            cache
                .set_if_absent("k", b"b".to_vec(), Duration::from_secs(5))
                .await?
        );
        assert_eq!(cache.get("k").await?, Some(b"b".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn delete_if_value_checks_the_value() -> Result<()> {
        let cache = MemoryCache::new();
        cache.set("k", b"mine".to_vec(), None).await?;
        assert!(!cache.delete_if_value("k", b"theirs").await?);
        assert!(cache.get("k").await?.is_some());
        assert!(cache.delete_if_value("k", b"mine").await?);
        assert_eq!(cache.get("k").await?, None);
        assert!(!cache.delete_if_value("k", b"mine").await?);
        Ok(())
    }

    #[tokio::test]
    async fn expire_refreshes_ttl_of_live_keys_only() -> Result<()> {
        let cache = MemoryCache::new();
        cache
            .set("k", b"v".to_vec(), Some(Duration::from_millis(30)))
            .await?;
        assert!(cache.expire("k", Duration::from_secs(60)).await?);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("k").await?.is_some());
        assert!(!cache.expire("missing", Duration::from_secs(1)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn outage_toggle_fails_every_operation() {
        let cache = MemoryCache::new();
        cache.set_unavailable(true);
        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, Error::Upstream { service, .. } if service == "shared-cache"));
        cache.set_unavailable(false);
        assert!(cache.get("k").await.is_ok());
    }
}
