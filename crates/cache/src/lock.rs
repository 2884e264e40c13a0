//! Distributed mutual exclusion keyed per record.
//!
//! Acquisition is a single atomic set-if-absent in the shared cache; the TTL
//! bounds the damage of a holder crashing mid-critical-section. Each
//! acquisition stores a random owner token, and release is a conditional
//! compare-and-delete on that token: a holder whose TTL lapsed cannot delete
//! the lock out from under the next holder. A refused release is logged as a
//! lock steal, which is an observable anomaly, not a failure of the caller.

use crate::traits::SharedCache;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::Result;
use uuid::Uuid;

/// Factory for per-key lock acquisitions against one shared cache.
#[derive(Clone)]
pub struct DistributedLock {
    cache: Arc<dyn SharedCache>,
    ttl: Duration,
}

impl DistributedLock {
    pub fn new(cache: Arc<dyn SharedCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Try to take the lock at `key`. `Ok(None)` means another holder has
    /// it. No waiting is built in; callers implement their own backoff.
    pub async fn acquire(&self, key: &str) -> Result<Option<LockGuard>> {
        let token = Uuid::new_v4().to_string();
        let won = self
            .cache
            .set_if_absent(key, token.clone().into_bytes(), self.ttl)
            .await?;
        if won {
            Ok(Some(LockGuard {
                key: key.to_string(),
                token,
                cache: Arc::clone(&self.cache),
            }))
        } else {
            Ok(None)
        }
    }
}

impl std::fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Proof of a held lock. Must be released explicitly; if the holder dies
/// first, the TTL frees the lock.
pub struct LockGuard {
    key: String,
    token: String,
    cache: Arc<dyn SharedCache>,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock. Never fails: a token mismatch or a cache outage is
    /// logged and otherwise ignored, since the TTL will free the lock anyway.
    pub async fn release(self) {
        match self
            .cache
            .delete_if_value(&self.key, self.token.as_bytes())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    key = %self.key,
                    "lock expired before release and may have been taken by another holder"
                );
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to release lock");
            }
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}
