//! Shared constants for the storefront cache layer.

use std::time::Duration;

// Key namespaces. These are part of the external contract (other services
// and the warming job address the same keys), so they must stay bit-exact.
pub const CACHE_SHOP_KEY_PREFIX: &str = "cache:shop:";
pub const LOCK_SHOP_KEY_PREFIX: &str = "lock:shop:";
pub const CACHE_SHOP_CATEGORY_KEY: &str = "cache:shopType";

// Physical TTLs. The negative TTL must stay materially shorter than the
// positive TTL: an absent marker only needs to soak up repeated lookups for
// a missing id, not survive as long as real data.
pub const DEFAULT_POSITIVE_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(2 * 60);

// Mutual exclusion. The lock TTL bounds the damage of a holder crashing
// mid-critical-section; after it lapses the lock is implicitly free.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10);

// Single-flight spin policy: waiters re-check the cache up to `MAX_SPINS`
// times, sleeping `SPIN_DELAY` between attempts (about 5s worst case).
pub const DEFAULT_MAX_SPINS: u32 = 100;
pub const DEFAULT_SPIN_DELAY: Duration = Duration::from_millis(50);

// Background rebuild pool.
pub const DEFAULT_REBUILD_WORKERS: usize = 4;
pub const DEFAULT_REBUILD_QUEUE_CAPACITY: usize = 64;

// How far into the future a rebuilt or warmed entry's logical expiry is set.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(20);
