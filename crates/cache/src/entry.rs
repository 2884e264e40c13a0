//! Cache entry representation and codec.
//!
//! An entry distinguishes three states the read strategies care about:
//! a present value, a known-absent marker (negative caching), and a value
//! carrying a logical expiry inside the payload. "Not cached at all" is the
//! fourth state, represented by the shared cache returning nothing.
//!
//! The wire shape is tagged JSON and must stay stable: the warming job and
//! any sibling service decode the same bytes.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use storefront_core::{Error, Result};

/// A value cached together with its expiry metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheEntry<T> {
    /// A record that exists. Physical TTL is enforced by the shared cache.
    Present { value: T },
    /// Negative marker: the store confirmed this key has no record.
    Absent,
    /// A pre-warmed record with logical expiry in the payload. Stored with
    /// no physical TTL; staleness is judged against `logical_expire_at`.
    Timed {
        value: T,
        logical_expire_at: DateTime<Utc>,
    },
}

impl<T> CacheEntry<T> {
    pub fn present(value: T) -> Self {
        Self::Present { value }
    }

    pub fn absent() -> Self {
        Self::Absent
    }

    pub fn timed(value: T, logical_expire_at: DateTime<Utc>) -> Self {
        Self::Timed {
            value,
            logical_expire_at,
        }
    }

    /// Whether the entry may be served as fresh at `now`. Absent markers are
    /// "fresh" in the sense that they are authoritative until physical TTL
    /// removes them.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Present { .. } | Self::Absent => true,
            Self::Timed {
                logical_expire_at, ..
            } => now < *logical_expire_at,
        }
    }
}

/// Serialize an entry for storage under `key`.
pub fn encode<T: Serialize>(key: &str, entry: &CacheEntry<T>) -> Result<Vec<u8>> {
    serde_json::to_vec(entry).map_err(|e| Error::CorruptEntry {
        key: key.to_string(),
        reason: format!("encode failed: {e}"),
    })
}

/// Decode bytes read from the shared cache under `key`.
///
/// Malformed bytes surface as [`Error::CorruptEntry`]; callers treat that
/// identically to a miss and fail open toward a store read.
pub fn decode<T: DeserializeOwned>(key: &str, raw: &[u8]) -> Result<CacheEntry<T>> {
    serde_json::from_slice(raw).map_err(|e| Error::CorruptEntry {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
