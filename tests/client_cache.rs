use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tillsync::cache::CacheSource;
use tillsync::client::{ApiClient, ClientError, DataStore, RemoteApi};
use tillsync::db::{DocumentStore, SqliteStore};
use tillsync::http::router;
use tillsync::model::{EntityKind, Product};
use tillsync::sync::{Connectivity, ReplicationState, Replicator};
use tokio::net::TcpListener;

async fn serve(primary: Arc<SqliteStore>) -> SocketAddr {
  let replication = ReplicationState::new(Connectivity::new(false), Replicator::new(None));
  let app = router(primary, replication);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  addr
}

async fn client(primary: Arc<SqliteStore>) -> DataStore<ApiClient> {
  let addr = serve(primary).await;
  DataStore::new(ApiClient::new(&format!("http://{}", addr)).unwrap())
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
  let primary = Arc::new(SqliteStore::open_in_memory().unwrap());
  primary
    .create(EntityKind::Product, json!({ "name": "Scarf", "stock": 2 }))
    .unwrap();
  let store = client(primary.clone()).await;

  let first = store.products(false).await;
  assert_eq!(first.source, CacheSource::Network);
  assert_eq!(first.data.len(), 1);

  // Written behind the client's back, so only a refetch would see it
  primary
    .create(EntityKind::Product, json!({ "name": "Beanie", "stock": 9 }))
    .unwrap();

  let second = store.products(false).await;
  assert_eq!(second.source, CacheSource::CacheFresh);
  assert_eq!(second.data, first.data);

  let forced = store.products(true).await;
  assert_eq!(forced.source, CacheSource::Network);
  assert_eq!(forced.data.len(), 2);
}

#[tokio::test]
async fn writes_through_store_invalidate_dashboard() {
  let primary = Arc::new(SqliteStore::open_in_memory().unwrap());
  let store = client(primary).await;

  let before = store.dashboard_stats(false).await;
  assert_eq!(before.source, CacheSource::Network);
  assert_eq!(before.data.transaction_count, 0);

  store
    .create(
      EntityKind::Transaction,
      json!({
        "total": 42.5,
        "status": "completed",
        "type": "sale",
        "createdAt": Utc::now().to_rfc3339(),
      }),
    )
    .await
    .unwrap();

  let after = store.dashboard_stats(false).await;
  assert_eq!(after.source, CacheSource::Network);
  assert_eq!(after.data.transaction_count, 1);
  assert_eq!(after.data.today_sales, 42.5);

  let again = store.dashboard_stats(false).await;
  assert_eq!(again.source, CacheSource::CacheFresh);
}

#[tokio::test]
async fn update_and_remove_round_trip() {
  let primary = Arc::new(SqliteStore::open_in_memory().unwrap());
  let store = client(primary).await;

  let created = store
    .create(EntityKind::Product, json!({ "name": "Parka", "price": 210.0, "stock": 3 }))
    .await
    .unwrap();
  let id = created["_id"].as_str().unwrap().to_string();

  let updated = store
    .update(EntityKind::Product, &id, json!({ "stock": 1 }))
    .await
    .unwrap();
  assert_eq!(updated["stock"], json!(1));
  assert_eq!(updated["name"], json!("Parka"));

  let products = store.products(false).await.data;
  assert_eq!(
    products,
    vec![Product {
      id: id.clone(),
      name: "Parka".into(),
      price: 210.0,
      stock: 1,
      ..Default::default()
    }]
  );

  store.remove(EntityKind::Product, &id).await.unwrap();
  assert!(store.products(false).await.data.is_empty());
}

#[tokio::test]
async fn backend_errors_surface_as_rejections() {
  let primary = Arc::new(SqliteStore::open_in_memory().unwrap());
  let store = client(primary).await;

  let err = store
    .api()
    .update(EntityKind::Employee, "nobody", json!({ "role": "x" }))
    .await
    .unwrap_err();

  match err {
    ClientError::Rejected { status, message } => {
      assert_eq!(status, 404);
      assert!(!message.is_empty());
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn unreachable_backend_serves_last_known_data() {
  let primary = Arc::new(SqliteStore::open_in_memory().unwrap());
  primary
    .create(EntityKind::Brand, json!({ "name": "Nordfolk" }))
    .unwrap();

  // Reserve a port, then free it so nothing is listening there
  let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let dead_addr = dead.local_addr().unwrap();
  drop(dead);

  let offline = DataStore::new(ApiClient::new(&format!("http://{}", dead_addr)).unwrap());
  let empty = offline.brands(false).await;
  assert_eq!(empty.source, CacheSource::Offline);
  assert!(empty.data.is_empty());
  assert!(empty.cached_at.is_none());

  // Immediately stale, so every read goes back to the network
  let store = client(primary)
    .await
    .with_stale_time(Duration::zero());
  let fetched = store.brands(false).await;
  assert_eq!(fetched.source, CacheSource::Network);
  assert_eq!(fetched.data.len(), 1);
  assert_eq!(store.brands(false).await.source, CacheSource::Network);
}
