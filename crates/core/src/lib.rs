//! Core domain types, errors, and constants for the storefront cache layer.
//!
//! This crate holds the building blocks shared by every other storefront
//! crate:
//!
//! - **`errors`**: the single `Error` enum and `Result` alias used across
//!   the cache layer, so failure modes stay predictable at every seam.
//! - **`types`**: the domain records the cache layer moves around (`Shop`,
//!   `ShopCategory`).
//! - **`constants`**: stable key namespaces and policy defaults. The key
//!   prefixes are part of the external contract and must never change
//!   silently.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::{Shop, ShopCategory, ShopId},
};
