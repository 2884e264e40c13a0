//! Cache and lock key construction.
//!
//! Key shapes are part of the external contract: the warming job and any
//! sibling service computing the same keys must agree bit-exactly.

use storefront_core::{
    ShopId, CACHE_SHOP_CATEGORY_KEY, CACHE_SHOP_KEY_PREFIX, LOCK_SHOP_KEY_PREFIX,
};

/// Key under which a shop record (or its absent marker) is cached.
pub fn shop_entry_key(id: ShopId) -> String {
    format!("{CACHE_SHOP_KEY_PREFIX}{id}")
}

/// Key of the mutual-exclusion lock guarding loads of one shop.
pub fn shop_lock_key(id: ShopId) -> String {
    format!("{LOCK_SHOP_KEY_PREFIX}{id}")
}

/// Key under which the whole category list is cached.
pub fn category_list_key() -> &'static str {
    CACHE_SHOP_CATEGORY_KEY
}
