//! SQLite-backed document store.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use super::schema::SCHEMA;
use super::{generate_id, DocumentStore, ReadyState, Record, StoreError};
use crate::model::EntityKind;

/// Document store holding every collection in a single SQLite table.
pub struct SqliteStore {
  conn: Mutex<Option<Connection>>,
  state: AtomicU8,
}

impl SqliteStore {
  /// Open or create a store at `path`, creating parent directories.
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// Open a throwaway store that lives as long as the value.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(SCHEMA)?;

    Ok(Self {
      conn: Mutex::new(Some(conn)),
      state: AtomicU8::new(ReadyState::Connected as u8),
    })
  }

  fn with_conn<T>(
    &self,
    f: impl FnOnce(&Connection) -> Result<T, StoreError>,
  ) -> Result<T, StoreError> {
    let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    let conn = guard.as_ref().ok_or(StoreError::Disconnected)?;
    f(conn)
  }
}

impl DocumentStore for SqliteStore {
  fn create(&self, kind: EntityKind, data: Value) -> Result<Record, StoreError> {
    let Value::Object(mut doc) = data else {
      return Err(StoreError::InvalidDocument);
    };

    let id = match doc.get("_id") {
      Some(Value::String(id)) if !id.is_empty() => id.clone(),
      _ => generate_id(),
    };
    doc.insert("_id".to_string(), Value::String(id.clone()));
    stamp_new(&mut doc);

    self.with_conn(|conn| {
      insert(conn, kind, &id, &doc)?;
      Ok(Value::Object(doc))
    })
  }

  fn find_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError> {
    self.with_conn(|conn| load(conn, kind, id))
  }

  fn list(&self, kind: EntityKind) -> Result<Vec<Record>, StoreError> {
    self.with_conn(|conn| {
      let mut stmt = conn.prepare(
        "SELECT data FROM documents WHERE kind = ? ORDER BY created_at, rowid",
      )?;

      let rows = stmt.query_map(params![kind.storage_name()], |row| row.get::<_, Vec<u8>>(0))?;

      let mut records = Vec::new();
      for row in rows {
        records.push(serde_json::from_slice(&row?)?);
      }
      Ok(records)
    })
  }

  fn update_by_id(
    &self,
    kind: EntityKind,
    id: &str,
    data: Value,
    upsert: bool,
  ) -> Result<Option<Record>, StoreError> {
    let Value::Object(patch) = data else {
      return Err(StoreError::InvalidDocument);
    };
    let stamped = patch.contains_key("updatedAt");

    self.with_conn(|conn| match load(conn, kind, id)? {
      Some(Value::Object(mut doc)) => {
        for (key, value) in patch {
          if key != "_id" {
            doc.insert(key, value);
          }
        }
        if !stamped {
          doc.insert("updatedAt".to_string(), Value::String(now()));
        }

        let updated_at = text_field(&doc, "updatedAt");
        conn.execute(
          "UPDATE documents SET data = ?, updated_at = ? WHERE kind = ? AND id = ?",
          params![
            serde_json::to_vec(&doc)?,
            updated_at,
            kind.storage_name(),
            id
          ],
        )?;
        Ok(Some(Value::Object(doc)))
      }
      Some(_) => Err(StoreError::InvalidDocument),
      None if upsert => {
        let mut doc = patch;
        doc.insert("_id".to_string(), Value::String(id.to_string()));
        stamp_new(&mut doc);
        insert(conn, kind, id, &doc)?;
        Ok(Some(Value::Object(doc)))
      }
      None => Ok(None),
    })
  }

  fn delete_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError> {
    self.with_conn(|conn| {
      let existing = load(conn, kind, id)?;
      if existing.is_some() {
        conn.execute(
          "DELETE FROM documents WHERE kind = ? AND id = ?",
          params![kind.storage_name(), id],
        )?;
      }
      Ok(existing)
    })
  }

  fn ready_state(&self) -> ReadyState {
    ReadyState::from_u8(self.state.load(Ordering::SeqCst))
  }

  fn close(&self) {
    self
      .state
      .store(ReadyState::Disconnecting as u8, Ordering::SeqCst);
    if let Ok(mut guard) = self.conn.lock() {
      guard.take();
    }
    self
      .state
      .store(ReadyState::Disconnected as u8, Ordering::SeqCst);
  }
}

fn now() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fill in timestamps a new document does not already carry.
fn stamp_new(doc: &mut Map<String, Value>) {
  let now = now();
  doc
    .entry("createdAt")
    .or_insert_with(|| Value::String(now.clone()));
  doc
    .entry("updatedAt")
    .or_insert_with(|| Value::String(now));
}

fn text_field(doc: &Map<String, Value>, key: &str) -> String {
  match doc.get(key) {
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
    None => now(),
  }
}

fn insert(
  conn: &Connection,
  kind: EntityKind,
  id: &str,
  doc: &Map<String, Value>,
) -> Result<(), StoreError> {
  let data = serde_json::to_vec(doc)?;
  let result = conn.execute(
    "INSERT INTO documents (kind, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    params![
      kind.storage_name(),
      id,
      data,
      text_field(doc, "createdAt"),
      text_field(doc, "updatedAt")
    ],
  );

  match result {
    Ok(_) => Ok(()),
    Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
      Err(StoreError::Duplicate {
        kind,
        id: id.to_string(),
      })
    }
    Err(e) => Err(e.into()),
  }
}

fn load(conn: &Connection, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError> {
  let data: Option<Vec<u8>> = conn
    .query_row(
      "SELECT data FROM documents WHERE kind = ? AND id = ?",
      params![kind.storage_name(), id],
      |row| row.get(0),
    )
    .optional()?;

  match data {
    Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
  }

  #[test]
  fn test_create_assigns_id_and_timestamps() {
    let store = store();
    let record = store
      .create(EntityKind::Product, json!({ "name": "Denim jacket", "stock": 3 }))
      .unwrap();

    let id = record["_id"].as_str().unwrap();
    assert_eq!(id.len(), 24);
    assert!(record["createdAt"].is_string());
    assert!(record["updatedAt"].is_string());

    let found = store.find_by_id(EntityKind::Product, id).unwrap().unwrap();
    assert_eq!(found, record);
  }

  #[test]
  fn test_create_keeps_given_id_and_rejects_duplicates() {
    let store = store();
    store
      .create(EntityKind::Cart, json!({ "_id": "cart-1", "items": [] }))
      .unwrap();

    let err = store
      .create(EntityKind::Cart, json!({ "_id": "cart-1" }))
      .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { .. }));

    // Same id under another kind is a different document
    store
      .create(EntityKind::Product, json!({ "_id": "cart-1" }))
      .unwrap();
  }

  #[test]
  fn test_create_rejects_non_objects() {
    let err = store()
      .create(EntityKind::Brand, json!(["not", "an", "object"]))
      .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocument));
  }

  #[test]
  fn test_update_merges_fields_and_preserves_id() {
    let store = store();
    let record = store
      .create(EntityKind::Product, json!({ "name": "Scarf", "stock": 10, "price": 20.0 }))
      .unwrap();
    let id = record["_id"].as_str().unwrap().to_string();

    let updated = store
      .update_by_id(
        EntityKind::Product,
        &id,
        json!({ "_id": "hijack", "stock": 4 }),
        false,
      )
      .unwrap()
      .unwrap();

    assert_eq!(updated["_id"], json!(id));
    assert_eq!(updated["stock"], json!(4));
    assert_eq!(updated["name"], json!("Scarf"));
    assert_eq!(
      store.find_by_id(EntityKind::Product, &id).unwrap(),
      Some(updated)
    );
  }

  #[test]
  fn test_update_missing_without_upsert_is_none() {
    let store = store();
    let result = store
      .update_by_id(EntityKind::Employee, "nobody", json!({ "name": "x" }), false)
      .unwrap();
    assert!(result.is_none());
    assert!(store.list(EntityKind::Employee).unwrap().is_empty());
  }

  #[test]
  fn test_upsert_inserts_missing_record() {
    let store = store();
    let data = json!({
      "_id": "emp-7",
      "name": "Ana",
      "createdAt": "2026-03-01T09:00:00.000Z",
      "updatedAt": "2026-03-02T09:00:00.000Z"
    });

    let record = store
      .update_by_id(EntityKind::Employee, "emp-7", data.clone(), true)
      .unwrap()
      .unwrap();

    assert_eq!(record, data);
  }

  #[test]
  fn test_delete_returns_removed_record() {
    let store = store();
    let record = store
      .create(EntityKind::StockMovement, json!({ "delta": -2 }))
      .unwrap();
    let id = record["_id"].as_str().unwrap();

    assert_eq!(
      store.delete_by_id(EntityKind::StockMovement, id).unwrap(),
      Some(record.clone())
    );
    assert_eq!(store.delete_by_id(EntityKind::StockMovement, id).unwrap(), None);
  }

  #[test]
  fn test_list_is_oldest_first_per_kind() {
    let store = store();
    for (n, created) in ["2026-01-03", "2026-01-01", "2026-01-02"].iter().enumerate() {
      store
        .create(
          EntityKind::Brand,
          json!({ "name": format!("brand-{}", n), "createdAt": format!("{}T00:00:00.000Z", created) }),
        )
        .unwrap();
    }
    store
      .create(EntityKind::Category, json!({ "name": "tops" }))
      .unwrap();

    let names: Vec<String> = store
      .list(EntityKind::Brand)
      .unwrap()
      .into_iter()
      .map(|r| r["name"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(names, vec!["brand-1", "brand-2", "brand-0"]);
  }

  #[test]
  fn test_closed_store_reports_disconnected() {
    let store = store();
    assert_eq!(store.ready_state(), ReadyState::Connected);

    store.close();

    assert_eq!(store.ready_state(), ReadyState::Disconnected);
    let err = store.list(EntityKind::Product).unwrap_err();
    assert!(matches!(err, StoreError::Disconnected));
  }
}
