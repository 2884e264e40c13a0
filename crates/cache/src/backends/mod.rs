//! Shared-cache backends.
//!
//! Production deployments point [`crate::traits::SharedCache`] at a real
//! network key-value service; [`MemoryCache`] is the in-process backend used
//! by tests and local development.

mod memory;

pub use memory::MemoryCache;
