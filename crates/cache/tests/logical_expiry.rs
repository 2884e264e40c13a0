//! Logical-expiry strategy: serve-stale, background rebuild, warming.

mod support;

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_cache::entry::{self, CacheEntry};
use storefront_cache::keys::shop_entry_key;
use storefront_cache::{CacheAccess, CacheConfig, MemoryCache, SharedCache, StrategyKind};
use storefront_core::{Result, Shop};
use support::{shop, CountingStore};

async fn put_stale_entry(cache: &MemoryCache, value: Shop) -> Result<()> {
    let key = shop_entry_key(value.id);
    let stale = CacheEntry::timed(value, Utc::now() - chrono::Duration::seconds(5));
    let raw = entry::encode(&key, &stale)?;
    cache.set(&key, raw, None).await
}

fn access_with(
    cache: &Arc<MemoryCache>,
    store: &Arc<CountingStore>,
    config: CacheConfig,
) -> CacheAccess {
    CacheAccess::new(
        Arc::clone(cache) as Arc<dyn SharedCache>,
        Arc::clone(store) as Arc<dyn storefront_cache::Store>,
        config,
    )
    .expect("valid config")
}

#[tokio::test]
async fn pure_miss_is_not_found_with_no_store_fallback() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::new());
    store.insert(shop(1));
    let access = access_with(&cache, &store, CacheConfig::default());

    // Not warmed, therefore never hot: definitive not-found.
    assert_eq!(access.read(1, StrategyKind::LogicalExpiry).await?, None);
    assert_eq!(store.point_lookups(), 0);
    Ok(())
}

#[tokio::test]
async fn fresh_entry_is_served_without_rebuild() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::new());
    store.insert(shop(2));
    let access = access_with(&cache, &store, CacheConfig::default());

    assert!(access.warm_shop(2, Duration::from_secs(60)).await?);
    assert_eq!(
        access.read(2, StrategyKind::LogicalExpiry).await?,
        Some(shop(2))
    );
    assert_eq!(access.stats().rebuilds_dispatched, 0);
    // The warmed entry carries no physical TTL.
    assert_eq!(cache.remaining_ttl(&shop_entry_key(2)), Some(None));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_entry_is_served_immediately_and_rebuilt_once() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::with_latency(Duration::from_millis(300)));

    // The store already has a newer version than the stale cached one.
    let mut old = shop(7);
    old.name = "Old Name".to_string();
    store.insert(shop(7));
    put_stale_entry(&cache, old.clone()).await?;

    let access = Arc::new(access_with(&cache, &store, CacheConfig::default()));

    // Latency of the serve-stale read must not include the rebuild.
    let started = Instant::now();
    let first = access.read(7, StrategyKind::LogicalExpiry).await?;
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(first, Some(old.clone()));

    // Concurrent stale readers: all get the stale value, one rebuild total.
    let mut handles = Vec::new();
    for _ in 0..20 {
        let access = Arc::clone(&access);
        handles.push(tokio::spawn(async move {
            access.read(7, StrategyKind::LogicalExpiry).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("not cancelled")?, Some(old.clone()));
    }
    assert_eq!(access.stats().rebuilds_dispatched, 1);

    // After the rebuild lands, reads see the fresh store version.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(store.point_lookups(), 1);
    assert_eq!(
        access.read(7, StrategyKind::LogicalExpiry).await?,
        Some(shop(7))
    );
    assert_eq!(access.stats().rebuilds_dispatched, 1);
    Ok(())
}

#[tokio::test]
async fn corrupt_hot_entry_reads_as_not_found() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::new());
    store.insert(shop(4));
    cache
        .set(&shop_entry_key(4), b"\xff\xfe".to_vec(), None)
        .await?;
    let access = access_with(&cache, &store, CacheConfig::default());

    assert_eq!(access.read(4, StrategyKind::LogicalExpiry).await?, None);
    assert_eq!(store.point_lookups(), 0);
    assert_eq!(access.stats().corrupt_entries, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn full_rebuild_queue_drops_the_episode_and_frees_the_lock() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::with_latency(Duration::from_millis(200)));
    for id in 1..=3 {
        store.insert(shop(id));
        put_stale_entry(&cache, shop(id)).await?;
    }

    let access = access_with(
        &cache,
        &store,
        CacheConfig {
            rebuild_workers: 1,
            rebuild_queue_capacity: 1,
            ..CacheConfig::default()
        },
    );

    // First stale read occupies the worker, second fills the queue, third
    // is dropped; every read still answers immediately.
    assert!(access.read(1, StrategyKind::LogicalExpiry).await?.is_some());
    // Give the worker a beat to pick the first task off the queue.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(access.read(2, StrategyKind::LogicalExpiry).await?.is_some());
    assert!(access.read(3, StrategyKind::LogicalExpiry).await?.is_some());
    let snapshot = access.stats();
    assert_eq!(snapshot.rebuilds_dispatched, 2);
    assert_eq!(snapshot.rebuilds_dropped, 1);

    // The dropped episode released its lock: once the backlog clears, the
    // next stale read can dispatch again.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(access.read(3, StrategyKind::LogicalExpiry).await?.is_some());
    assert_eq!(access.stats().rebuilds_dispatched, 3);
    Ok(())
}

#[tokio::test]
async fn warming_a_missing_record_clears_the_entry() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::new());
    put_stale_entry(&cache, shop(12)).await?;
    let access = access_with(&cache, &store, CacheConfig::default());

    assert!(!access.warm_shop(12, Duration::from_secs(60)).await?);
    assert_eq!(access.read(12, StrategyKind::LogicalExpiry).await?, None);
    Ok(())
}

#[tokio::test]
async fn warm_then_expire_then_rebuild_round() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::new());
    store.insert(shop(6));
    let access = access_with(&cache, &store, CacheConfig::default());

    assert!(access.warm_shop(6, Duration::from_millis(40)).await?);
    assert_eq!(
        access.read(6, StrategyKind::LogicalExpiry).await?,
        Some(shop(6))
    );
    assert_eq!(access.stats().rebuilds_dispatched, 0);

    tokio::time::sleep(Duration::from_millis(80)).await;
    // Stale now: still served, rebuild goes out.
    assert_eq!(
        access.read(6, StrategyKind::LogicalExpiry).await?,
        Some(shop(6))
    );
    assert_eq!(access.stats().rebuilds_dispatched, 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        access.read(6, StrategyKind::LogicalExpiry).await?,
        Some(shop(6))
    );
    Ok(())
}

#[tokio::test]
async fn shutdown_waits_for_inflight_rebuilds() -> Result<()> {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(CountingStore::with_latency(Duration::from_millis(50)));
    store.insert(shop(8));
    put_stale_entry(&cache, shop(8)).await?;
    let access = access_with(&cache, &store, CacheConfig::default());

    assert!(access.read(8, StrategyKind::LogicalExpiry).await?.is_some());
    access.shutdown().await;

    // The rebuild completed before shutdown returned.
    let raw = cache.get(&shop_entry_key(8)).await?.expect("entry present");
    let rebuilt: CacheEntry<Shop> = entry::decode(&shop_entry_key(8), &raw)?;
    assert!(rebuilt.is_fresh(Utc::now()));
    Ok(())
}
