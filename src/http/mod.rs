//! REST API over the primary store, with the write interceptor attached to the
//! collection routes.

mod envelope;
mod handlers;

use axum::{
  extract::{Path, State},
  middleware,
  routing::{get, put},
  Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

use crate::db::DocumentStore;
use crate::model::EntityKind;
use crate::sync::{dual_write_layer, ReplicationRoutes, ReplicationState};

pub use envelope::{ApiError, ApiResponse};
pub use handlers::{ConnectivityUpdate, Health};

#[derive(Clone)]
pub struct AppState {
  pub primary: Arc<dyn DocumentStore>,
  pub replication: ReplicationState,
}

/// Build the API router.
///
/// Every collection gets `/api/{segment}` and `/api/{segment}/{id}` routes.
/// Mirrored kinds have both patterns registered in the replication table as
/// they are added.
pub fn router(primary: Arc<dyn DocumentStore>, replication: ReplicationState) -> Router {
  let mut targets = ReplicationRoutes::new();
  let mut api: Router<AppState> = Router::new();

  for kind in EntityKind::ALL {
    let collection = format!("/api/{}", kind.route_segment());
    let item = format!("{}/{{id}}", collection);

    let update = move |State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<Value>| {
      handlers::update(state, kind, id, body)
    };

    api = api
      .route(
        &collection,
        get(move |State(state): State<AppState>| handlers::list(state, kind)).post(
          move |State(state): State<AppState>, Json(body): Json<Value>| {
            handlers::create(state, kind, body)
          },
        ),
      )
      .route(
        &item,
        get(move |State(state): State<AppState>, Path(id): Path<String>| {
          handlers::find(state, kind, id)
        })
        .put(update.clone())
        .patch(update)
        .delete(move |State(state): State<AppState>, Path(id): Path<String>| {
          handlers::remove(state, kind, id)
        }),
      );

    if kind.is_mirrored() {
      targets.register(collection, kind);
      targets.register(item, kind);
    }
  }

  let replication = replication.with_routes(targets);
  let state = AppState {
    primary,
    replication: replication.clone(),
  };

  api
    .route_layer(middleware::from_fn_with_state(replication, dual_write_layer))
    .route("/api/health", get(handlers::health))
    .route("/api/sync/connectivity", put(handlers::set_connectivity))
    .with_state(state)
}
