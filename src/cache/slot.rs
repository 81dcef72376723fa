use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Entry<T> {
  value: Option<T>,
  fetched_at: Option<DateTime<Utc>>,
}

/// One cached collection: the last fetched value and when it was fetched.
///
/// Invalidation clears only the timestamp; the value is kept so it can still
/// be served if the next fetch fails.
#[derive(Debug)]
pub struct CacheSlot<T> {
  name: &'static str,
  entry: Mutex<Entry<T>>,
}

impl<T: Clone> CacheSlot<T> {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      entry: Mutex::new(Entry {
        value: None,
        fetched_at: None,
      }),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Current value and fetch time.
  pub fn snapshot(&self) -> (Option<T>, Option<DateTime<Utc>>) {
    let entry = self.lock();
    (entry.value.clone(), entry.fetched_at)
  }

  /// Replace the value and stamp it with `fetched_at`.
  pub fn store(&self, value: T, fetched_at: DateTime<Utc>) {
    let mut entry = self.lock();
    entry.value = Some(value);
    entry.fetched_at = Some(fetched_at);
  }

  pub fn invalidate(&self) {
    self.lock().fetched_at = None;
  }

  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.lock().fetched_at
  }

  fn lock(&self) -> MutexGuard<'_, Entry<T>> {
    self.entry.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_invalidate_keeps_value() {
    let slot = CacheSlot::new("brands");
    let now = Utc::now();
    slot.store(vec!["Levi's"], now);
    assert_eq!(slot.fetched_at(), Some(now));

    slot.invalidate();

    let (value, fetched_at) = slot.snapshot();
    assert_eq!(value, Some(vec!["Levi's"]));
    assert_eq!(fetched_at, None);
  }
}
