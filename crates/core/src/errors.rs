//! Error taxonomy for the storefront cache layer.
//!
//! "Not found" is deliberately not an error: a negative-cache hit or a
//! confirmed store miss is a valid answer, carried as `Ok(None)` by the read
//! paths. The variants here cover the failures a caller can actually act on,
//! plus the internal anomalies the cache layer absorbs and logs.

use std::time::Duration;

/// Result type alias for storefront operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the storefront cache layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cached entry failed to decode. Read paths treat this as a miss and
    /// never surface it to callers directly; it shows up in logs and stats.
    #[error("corrupt cache entry for '{key}': {reason}")]
    CorruptEntry { key: String, reason: String },

    /// A single-flight read exhausted its spin budget without observing a
    /// populated cache or winning the lock. Retryable.
    #[error("gave up waiting for another loader of '{key}' after {waited:?}")]
    Busy { key: String, waited: Duration },

    /// The store or the shared cache was unreachable. Retryable.
    #[error("{service} unavailable during {operation}: {message}")]
    Upstream {
        service: &'static str,
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The rebuild queue was full and a rebuild was dropped. Internal to the
    /// logical-expiry path; reads never return this.
    #[error("rebuild queue full, dropped rebuild for '{key}'")]
    RebuildQueueFull { key: String },

    /// Invalid configuration detected at construction time.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Shorthand for a shared-cache outage.
    pub fn cache_unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: "shared-cache",
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a store outage.
    pub fn store_unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: "store",
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// True for failures a caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::Upstream { .. })
    }
}
