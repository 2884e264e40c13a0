//! Cache-access layer for storefront records.
//!
//! Sits in front of a slow persistent store and defeats the three classic
//! read-heavy-cache failure modes:
//!
//! - **Penetration**: repeated lookups for ids that exist nowhere are
//!   absorbed by short-lived absent markers (negative caching).
//! - **Breakdown**: a hot key expiring does not stampede the store; a
//!   distributed lock ensures a single in-flight load per key while other
//!   readers spin on the cache.
//! - **Staleness vs. availability**: pre-warmed hot records carry a logical
//!   expiry inside the payload and are always served immediately, with a
//!   lock-gated background rebuild when stale.
//!
//! The layer consumes two collaborator traits ([`SharedCache`] and
//! [`Store`]) and exposes one facade, [`CacheAccess`], whose read behavior
//! is selected per call by [`StrategyKind`]. It is deliberately not a
//! general cache library: no eviction policy, no LRU, no quotas.

pub mod access;
pub mod backends;
pub mod config;
pub mod entry;
pub mod keys;
pub mod lock;
pub mod rebuild;
pub mod stats;
pub mod strategy;
pub mod traits;

pub use access::CacheAccess;
pub use backends::MemoryCache;
pub use config::{CacheConfig, OnCacheUnavailable};
pub use entry::CacheEntry;
pub use lock::{DistributedLock, LockGuard};
pub use stats::{CacheStats, StatsSnapshot};
pub use strategy::{CacheStrategy, StrategyKind};
pub use traits::{SharedCache, Store};
