use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a 24 character hex document id.
///
/// Same shape as the ids the hosted document database hands out, so records
/// created here and records created upstream look alike.
pub fn generate_id() -> String {
  let nanos = chrono::Utc::now()
    .timestamp_nanos_opt()
    .unwrap_or_default();
  let counter = ID_COUNTER.fetch_add(1, Ordering::SeqCst);

  let mut hasher = Sha256::new();
  hasher.update(nanos.to_be_bytes());
  hasher.update(std::process::id().to_be_bytes());
  hasher.update(counter.to_be_bytes());
  let digest = hasher.finalize();
  hex::encode(&digest[..12])
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_ids_are_hex_and_unique() {
    let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
    assert_eq!(ids.len(), 1000);
    for id in ids {
      assert_eq!(id.len(), 24);
      assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
  }
}
