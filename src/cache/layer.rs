//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

use super::slot::CacheSlot;
use super::traits::CacheResult;

/// How long fetched data stays valid, in seconds.
pub const DEFAULT_STALE_SECS: i64 = 5 * 60;

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the network client. Concurrent
/// misses on the same slot are not merged: each one fetches, and the last to
/// finish wins.
#[derive(Debug, Clone, Copy)]
pub struct CacheLayer {
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl Default for CacheLayer {
  fn default() -> Self {
    Self::new()
  }
}

impl CacheLayer {
  pub fn new() -> Self {
    Self {
      stale_time: Duration::seconds(DEFAULT_STALE_SECS),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn stale_time(&self) -> Duration {
    self.stale_time
  }

  /// Check if data fetched at `cached_at` is past its TTL.
  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at >= self.stale_time
  }

  /// Fetch through `slot` with a cache-first strategy.
  ///
  /// 1. Unless `force`, serve the cached value while it is within the TTL
  /// 2. Otherwise fetch and stamp the slot
  /// 3. On fetch failure log and serve the previous value (default when
  ///    there is none), leaving the slot untouched
  pub async fn fetch<T, E, F, Fut>(&self, slot: &CacheSlot<T>, force: bool, fetcher: F) -> CacheResult<T>
  where
    T: Clone + Default,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let (cached, cached_at) = slot.snapshot();

    if !force {
      if let (Some(value), Some(at)) = (&cached, cached_at) {
        if !self.is_stale(at) {
          debug!(collection = slot.name(), "cache hit");
          return CacheResult::from_cache(value.clone(), at);
        }
      }
    }

    match fetcher().await {
      Ok(data) => {
        slot.store(data.clone(), Utc::now());
        CacheResult::from_network(data)
      }
      Err(e) => {
        warn!(collection = slot.name(), error = %e, "fetch failed, serving last known value");
        CacheResult::offline(cached.unwrap_or_default(), cached_at)
      }
    }
  }
}
