//! Domain records the cache layer moves around.
//!
//! These are immutable from the cache layer's point of view: it reads them
//! from the store, serializes them into the shared cache, and hands them to
//! callers. Mutation happens in the store, followed by cache invalidation.

use serde::{Deserialize, Serialize};

/// Identifier of a shop record; doubles as the cache and lock key suffix.
pub type ShopId = i64;

/// A shop record as served by the cache layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    /// Category this shop belongs to (see [`ShopCategory`]).
    pub category_id: i64,
    pub address: String,
    /// Average price in cents, when known.
    pub avg_price: Option<u32>,
    /// Aggregate rating on a 0..=50 scale, when known.
    pub score: Option<u32>,
    pub open_hours: Option<String>,
}

/// A shop category, cached as a whole ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopCategory {
    pub id: i64,
    pub name: String,
    /// Display ordering, ascending.
    pub sort: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shop_serde_round_trip() {
        let shop = Shop {
            id: 7,
            name: "Nine Dragons Noodle House".to_string(),
            category_id: 3,
            address: "12 Canal St".to_string(),
            avg_price: Some(4200),
            score: Some(47),
            open_hours: Some("10:00-22:00".to_string()),
        };
        let json = serde_json::to_string(&shop).unwrap();
        let back: Shop = serde_json::from_str(&json).unwrap();
        assert_eq!(shop, back);
    }

    #[test]
    fn optional_fields_default_to_none() {
        let json = r#"{"id":1,"name":"a","category_id":2,"address":"b","avg_price":null,"score":null,"open_hours":null}"#;
        let shop: Shop = serde_json::from_str(json).unwrap();
        assert_eq!(shop.avg_price, None);
        assert_eq!(shop.open_hours, None);
    }
}
