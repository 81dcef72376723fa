//! Document storage used for both the primary (cloud) and secondary (local)
//! copies of the data.

mod ids;
pub mod schema;
mod sqlite;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::EntityKind;

pub use ids::generate_id;
pub use sqlite::SqliteStore;

/// A stored document. Always a JSON object carrying an `_id` string.
pub type Record = Value;

/// Connection readiness, in the numbering the hosted database driver reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ReadyState {
  Disconnected = 0,
  Connected = 1,
  Connecting = 2,
  Disconnecting = 3,
}

impl ReadyState {
  pub(crate) fn from_u8(value: u8) -> Self {
    match value {
      1 => Self::Connected,
      2 => Self::Connecting,
      3 => Self::Disconnecting,
      _ => Self::Disconnected,
    }
  }
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store is not connected")]
  Disconnected,
  #[error("document must be a JSON object")]
  InvalidDocument,
  #[error("{kind} {id} already exists")]
  Duplicate { kind: EntityKind, id: String },
  #[error("lock poisoned")]
  Poisoned,
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("serialization: {0}")]
  Serde(#[from] serde_json::Error),
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

/// CRUD over per-kind document collections.
///
/// Calls are synchronous and short; callers on the async runtime invoke them
/// directly.
pub trait DocumentStore: Send + Sync {
  /// Insert a new document. An `_id` is generated when the payload has none.
  fn create(&self, kind: EntityKind, data: Value) -> Result<Record, StoreError>;

  fn find_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError>;

  /// All documents of a kind, oldest first.
  fn list(&self, kind: EntityKind) -> Result<Vec<Record>, StoreError>;

  /// Merge `data`'s top-level fields into the stored document.
  ///
  /// With `upsert` a missing document is inserted under `id`. Returns `None`
  /// when nothing matched and `upsert` is false.
  fn update_by_id(
    &self,
    kind: EntityKind,
    id: &str,
    data: Value,
    upsert: bool,
  ) -> Result<Option<Record>, StoreError>;

  /// Remove a document, returning it if it existed.
  fn delete_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError>;

  fn ready_state(&self) -> ReadyState;

  /// Drop the connection. Later operations fail with `StoreError::Disconnected`.
  fn close(&self);
}
