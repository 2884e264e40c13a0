//! Shared fixtures for the strategy integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use storefront_cache::Store;
use storefront_core::{Error, Result, Shop, ShopCategory, ShopId};

/// In-memory [`Store`] that counts calls and can simulate latency and
/// outages. The call counters are what the stampede properties assert on.
#[derive(Default)]
pub struct CountingStore {
    shops: DashMap<ShopId, Shop>,
    categories: RwLock<Vec<ShopCategory>>,
    point_lookups: AtomicUsize,
    list_lookups: AtomicUsize,
    latency: Duration,
    unavailable: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn insert(&self, shop: Shop) {
        self.shops.insert(shop.id, shop);
    }

    pub fn remove(&self, id: ShopId) {
        self.shops.remove(&id);
    }

    pub fn set_categories(&self, categories: Vec<ShopCategory>) {
        *self.categories.write() = categories;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn point_lookups(&self) -> usize {
        self.point_lookups.load(Ordering::SeqCst)
    }

    pub fn list_lookups(&self) -> usize {
        self.list_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self, operation: &'static str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable(operation, "store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn get_by_id(&self, id: ShopId) -> Result<Option<Shop>> {
        self.check_available("get_by_id")?;
        self.point_lookups.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.shops.get(&id).map(|s| s.clone()))
    }

    async fn update(&self, shop: &Shop) -> Result<()> {
        self.check_available("update")?;
        self.shops.insert(shop.id, shop.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<ShopCategory>> {
        self.check_available("list_categories")?;
        self.list_lookups.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.categories.read().clone())
    }
}

pub fn shop(id: ShopId) -> Shop {
    Shop {
        id,
        name: format!("Shop {id}"),
        category_id: 1,
        address: format!("{id} Main St"),
        avg_price: Some(2500),
        score: Some(42),
        open_hours: Some("09:00-21:00".to_string()),
    }
}

pub fn category(id: i64, name: &str, sort: i32) -> ShopCategory {
    ShopCategory {
        id,
        name: name.to_string(),
        sort,
    }
}
