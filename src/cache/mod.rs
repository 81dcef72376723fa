//! In-memory fetch cache for read-heavy collections.
//!
//! This module provides a network-agnostic caching mechanism that:
//! - Serves a collection from memory while it is within its TTL
//! - Refetches on force, expiry, or after invalidation
//! - Falls back to the last known value when a fetch fails

mod layer;
mod slot;
mod traits;

pub use layer::{CacheLayer, DEFAULT_STALE_SECS};
pub use slot::CacheSlot;
pub use traits::{CacheResult, CacheSource};
