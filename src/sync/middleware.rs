//! Write interceptor that mirrors successful API writes into the local store.
//!
//! Runs as a `route_layer` so the matched route pattern is known. The client
//! always receives the handler's response unchanged; replication happens on a
//! detached task afterwards.

use axum::{
  body::{Body, Bytes, HttpBody},
  extract::{MatchedPath, RawPathParams, Request, State},
  http::Method,
  middleware::Next,
  response::Response,
  RequestExt,
};
use futures::{future, stream};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::connectivity::Connectivity;
use super::replicator::{Mutation, Replicator};
use super::routes::ReplicationRoutes;
use crate::model::EntityKind;

/// Largest response body the interceptor will buffer.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Everything the interceptor needs, passed explicitly instead of hanging off
/// the request.
#[derive(Clone)]
pub struct ReplicationState {
  pub connectivity: Connectivity,
  pub replicator: Replicator,
  pub routes: Arc<ReplicationRoutes>,
  pub body_limit: usize,
}

impl ReplicationState {
  pub fn new(connectivity: Connectivity, replicator: Replicator) -> Self {
    Self {
      connectivity,
      replicator,
      routes: Arc::new(ReplicationRoutes::new()),
      body_limit: DEFAULT_BODY_LIMIT,
    }
  }

  pub fn with_routes(mut self, routes: ReplicationRoutes) -> Self {
    self.routes = Arc::new(routes);
    self
  }

  pub fn with_body_limit(mut self, body_limit: usize) -> Self {
    self.body_limit = body_limit;
    self
  }

  fn can_replicate(&self) -> bool {
    self.connectivity.is_online() && self.replicator.secondary_ready()
  }
}

/// Response body shape shared by every API route.
#[derive(Debug, Deserialize)]
struct Envelope {
  #[serde(default)]
  success: bool,
  #[serde(default)]
  data: Option<Value>,
}

/// Middleware mirroring successful create/update/delete responses.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn dual_write_layer(
  State(state): State<ReplicationState>,
  mut request: Request,
  next: Next,
) -> Response {
  let method = request.method().clone();
  if !is_write(&method) {
    return next.run(request).await;
  }

  let Some(pattern) = request
    .extensions()
    .get::<MatchedPath>()
    .map(|p| p.as_str().to_string())
  else {
    return next.run(request).await;
  };

  let Some(kind) = state.routes.resolve(&pattern) else {
    return next.run(request).await;
  };

  let id = record_id(&mut request).await;

  let response = next.run(request).await;

  if !response.status().is_success() || !state.can_replicate() {
    return response;
  }

  let (parts, body) = response.into_parts();

  // Leave bodies we can't bound alone
  let within_limit = body
    .size_hint()
    .upper()
    .is_some_and(|upper| upper <= state.body_limit as u64);
  if !within_limit {
    debug!(%kind, "response body too large to inspect, skipping replication");
    return Response::from_parts(parts, body);
  }

  let bytes = match axum::body::to_bytes(body, state.body_limit).await {
    Ok(bytes) => bytes,
    Err(e) => {
      warn!(%kind, error = %e, "failed to read response body, skipping replication");
      return Response::from_parts(parts, failed_body(e));
    }
  };

  if let Some(mutation) = plan_from_body(&method, kind, id.as_deref(), &bytes) {
    state.replicator.spawn(mutation);
  }

  Response::from_parts(parts, Body::from(bytes))
}

/// Percent-decoded `{id}` route parameter, as the handler's `Path` sees it.
async fn record_id(request: &mut Request) -> Option<String> {
  let params = request.extract_parts::<RawPathParams>().await.ok()?;
  params
    .iter()
    .find(|(name, _)| *name == "id")
    .map(|(_, value)| value.to_string())
    .filter(|value| !value.is_empty())
}

/// Body that yields `error` to whoever reads it, so a failed read surfaces as
/// a body error instead of a different response.
fn failed_body(error: axum::Error) -> Body {
  Body::from_stream(stream::once(future::ready(Err::<Bytes, _>(error))))
}

fn is_write(method: &Method) -> bool {
  matches!(
    *method,
    Method::POST | Method::PUT | Method::PATCH | Method::DELETE
  )
}

/// Build the mutation for a response body, if it qualifies.
fn plan_from_body(
  method: &Method,
  kind: EntityKind,
  id: Option<&str>,
  body: &Bytes,
) -> Option<Mutation> {
  let envelope: Envelope = serde_json::from_slice(body).ok()?;
  if !envelope.success {
    return None;
  }

  let data = envelope.data.filter(|data| !data.is_null())?;

  let mutation = Mutation::plan(method, kind, id, data);
  if mutation.is_none() {
    // TODO: confirm with the product owner whether id-less updates and
    // deletes should be mirrored instead of dropped.
    debug!(%kind, %method, "no record id on write, skipping replication");
  }
  mutation
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{DocumentStore, SqliteStore};
  use crate::sync::replicator::MutationOp;
  use axum::{
    http::StatusCode,
    routing::{post, MethodRouter},
    Json, Router,
  };
  use serde_json::json;
  use std::time::Duration;
  use tower::ServiceExt;

  fn carts_app(local: Arc<SqliteStore>, body_limit: usize, route: MethodRouter) -> Router {
    let mut routes = ReplicationRoutes::new();
    routes.register("/api/carts", EntityKind::Cart);
    let state = ReplicationState::new(
      Connectivity::new(true),
      Replicator::new(Some(local as Arc<dyn DocumentStore>)),
    )
    .with_routes(routes)
    .with_body_limit(body_limit);

    Router::new()
      .route("/api/carts", route)
      .route_layer(axum::middleware::from_fn_with_state(state, dual_write_layer))
  }

  fn created_cart() -> Value {
    json!({ "success": true, "data": { "_id": "c1", "note": "x".repeat(64) } })
  }

  async fn post_cart(app: Router) -> (StatusCode, Value) {
    let request = axum::http::Request::builder()
      .method(Method::POST)
      .uri("/api/carts")
      .body(Body::empty())
      .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  async fn mirrored(local: &SqliteStore) -> bool {
    tokio::time::sleep(Duration::from_millis(150)).await;
    local.find_by_id(EntityKind::Cart, "c1").unwrap().is_some()
  }

  fn body(value: Value) -> Bytes {
    Bytes::from(serde_json::to_vec(&value).unwrap())
  }

  #[test]
  fn test_plan_requires_success_and_data() {
    let data = json!({ "_id": "p1" });

    assert!(plan_from_body(
      &Method::POST,
      EntityKind::Product,
      None,
      &body(json!({ "success": true, "data": data }))
    )
    .is_some());

    assert!(plan_from_body(
      &Method::POST,
      EntityKind::Product,
      None,
      &body(json!({ "success": false, "data": data }))
    )
    .is_none());

    assert!(plan_from_body(
      &Method::POST,
      EntityKind::Product,
      None,
      &body(json!({ "success": true }))
    )
    .is_none());

    assert!(plan_from_body(
      &Method::POST,
      EntityKind::Product,
      None,
      &body(json!({ "success": true, "data": null }))
    )
    .is_none());
  }

  #[test]
  fn test_plan_ignores_non_envelope_bodies() {
    assert!(plan_from_body(
      &Method::POST,
      EntityKind::Product,
      None,
      &Bytes::from_static(b"created")
    )
    .is_none());
  }

  #[test]
  fn test_plan_uses_route_id_for_updates() {
    let mutation = plan_from_body(
      &Method::PUT,
      EntityKind::Transaction,
      Some("t9"),
      &body(json!({ "success": true, "data": { "_id": "t9", "total": 40 } })),
    )
    .unwrap();

    assert_eq!(
      mutation.op,
      MutationOp::Upsert {
        id: "t9".to_string(),
        data: json!({ "_id": "t9", "total": 40 })
      }
    );
  }

  #[test]
  fn test_only_write_methods_are_intercepted() {
    assert!(is_write(&Method::POST));
    assert!(is_write(&Method::PATCH));
    assert!(!is_write(&Method::GET));
    assert!(!is_write(&Method::OPTIONS));
  }

  #[tokio::test]
  async fn test_bounded_body_is_mirrored() {
    let local = Arc::new(SqliteStore::open_in_memory().unwrap());
    let app = carts_app(
      local.clone(),
      DEFAULT_BODY_LIMIT,
      post(|| async { (StatusCode::CREATED, Json(created_cart())) }),
    );

    let (status, body) = post_cart(app).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, created_cart());
    assert!(mirrored(&local).await);
  }

  #[tokio::test]
  async fn test_oversized_body_passes_through_unmirrored() {
    let local = Arc::new(SqliteStore::open_in_memory().unwrap());
    let app = carts_app(
      local.clone(),
      16,
      post(|| async { (StatusCode::CREATED, Json(created_cart())) }),
    );

    let (status, body) = post_cart(app).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, created_cart());
    assert!(!mirrored(&local).await);
  }

  #[tokio::test]
  async fn test_unbounded_body_passes_through_unmirrored() {
    let local = Arc::new(SqliteStore::open_in_memory().unwrap());
    let app = carts_app(
      local.clone(),
      DEFAULT_BODY_LIMIT,
      post(|| async {
        let chunk = Bytes::from(created_cart().to_string());
        let body = Body::from_stream(stream::iter([Ok::<_, std::io::Error>(chunk)]));
        (StatusCode::CREATED, body)
      }),
    );

    let (status, body) = post_cart(app).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, created_cart());
    assert!(!mirrored(&local).await);
  }

  #[tokio::test]
  async fn test_failed_body_reports_error_to_reader() {
    let body = failed_body(axum::Error::new(std::io::Error::other("connection reset")));
    assert!(axum::body::to_bytes(body, usize::MAX).await.is_err());
  }
}
