//! Cache layer configuration.
//!
//! Loading (files, env) is the host application's concern; this module only
//! defines the shape, the defaults, and construction-time validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use storefront_core::{
    Error, Result, DEFAULT_LOCK_TTL, DEFAULT_MAX_SPINS, DEFAULT_NEGATIVE_TTL,
    DEFAULT_POSITIVE_TTL, DEFAULT_REBUILD_QUEUE_CAPACITY, DEFAULT_REBUILD_WORKERS,
    DEFAULT_REFRESH_WINDOW, DEFAULT_SPIN_DELAY,
};

/// What a read should do when the shared cache itself is unreachable.
///
/// Falling through keeps serving traffic at the cost of exposing the store
/// to the full read load; failing protects the store and lets the caller
/// retry. Logical-expiry reads ignore this knob: they never touch the store
/// on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCacheUnavailable {
    /// Surface a retryable upstream error.
    #[default]
    Fail,
    /// Read the store directly, uncached.
    FallThrough,
}

/// Tunables for the cache-access layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Physical TTL for present entries (pass-through / single-flight).
    pub positive_ttl: Duration,
    /// Physical TTL for absent markers. Must be shorter than `positive_ttl`.
    pub negative_ttl: Duration,
    /// TTL of the per-record lock; bounds holder-crash damage.
    pub lock_ttl: Duration,
    /// Spin budget for single-flight waiters.
    pub max_spins: u32,
    /// Sleep between single-flight spins.
    pub spin_delay: Duration,
    /// Randomize each spin sleep to avoid retry alignment under contention.
    pub spin_jitter: bool,
    /// Workers in the rebuild pool.
    pub rebuild_workers: usize,
    /// Pending rebuilds beyond this are dropped (backpressure).
    pub rebuild_queue_capacity: usize,
    /// How far ahead a rebuilt or warmed entry's logical expiry is set.
    pub refresh_window: Duration,
    /// Policy for shared-cache outages on the read path.
    pub on_cache_unavailable: OnCacheUnavailable,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_ttl: DEFAULT_POSITIVE_TTL,
            negative_ttl: DEFAULT_NEGATIVE_TTL,
            lock_ttl: DEFAULT_LOCK_TTL,
            max_spins: DEFAULT_MAX_SPINS,
            spin_delay: DEFAULT_SPIN_DELAY,
            spin_jitter: true,
            rebuild_workers: DEFAULT_REBUILD_WORKERS,
            rebuild_queue_capacity: DEFAULT_REBUILD_QUEUE_CAPACITY,
            refresh_window: DEFAULT_REFRESH_WINDOW,
            on_cache_unavailable: OnCacheUnavailable::default(),
        }
    }
}

impl CacheConfig {
    /// Validate invariants the read strategies rely on.
    pub fn validate(&self) -> Result<()> {
        if self.negative_ttl >= self.positive_ttl {
            return Err(Error::Configuration {
                message: format!(
                    "negative_ttl ({:?}) must be shorter than positive_ttl ({:?})",
                    self.negative_ttl, self.positive_ttl
                ),
            });
        }
        if self.negative_ttl.is_zero() || self.lock_ttl.is_zero() {
            return Err(Error::Configuration {
                message: "negative_ttl and lock_ttl must be non-zero".to_string(),
            });
        }
        if self.max_spins == 0 || self.spin_delay.is_zero() {
            return Err(Error::Configuration {
                message: "max_spins and spin_delay must be non-zero".to_string(),
            });
        }
        if self.rebuild_workers == 0 || self.rebuild_queue_capacity == 0 {
            return Err(Error::Configuration {
                message: "rebuild_workers and rebuild_queue_capacity must be non-zero"
                    .to_string(),
            });
        }
        if self.refresh_window.is_zero() {
            return Err(Error::Configuration {
                message: "refresh_window must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Worst-case wall time a single-flight waiter can spend spinning.
    pub fn max_spin_wait(&self) -> Duration {
        self.spin_delay * self.max_spins
    }
}
