use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use super::envelope::{ApiError, ApiResponse};
use super::AppState;
use crate::db::{ReadyState, Record};
use crate::model::EntityKind;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[instrument(skip(state))]
pub async fn list(state: AppState, kind: EntityKind) -> ApiResult<Vec<Record>> {
  Ok(ApiResponse::ok(state.primary.list(kind)?))
}

#[instrument(skip(state))]
pub async fn find(state: AppState, kind: EntityKind, id: String) -> ApiResult<Record> {
  let record = state
    .primary
    .find_by_id(kind, &id)?
    .ok_or_else(|| ApiError::not_found(format!("{} {}", kind, id)))?;
  Ok(ApiResponse::ok(record))
}

#[instrument(skip(state, body))]
pub async fn create(
  state: AppState,
  kind: EntityKind,
  body: Value,
) -> Result<(StatusCode, Json<ApiResponse<Record>>), ApiError> {
  let record = state.primary.create(kind, body)?;
  Ok((StatusCode::CREATED, ApiResponse::ok(record)))
}

#[instrument(skip(state, body))]
pub async fn update(state: AppState, kind: EntityKind, id: String, body: Value) -> ApiResult<Record> {
  let record = state
    .primary
    .update_by_id(kind, &id, body, false)?
    .ok_or_else(|| ApiError::not_found(format!("{} {}", kind, id)))?;
  Ok(ApiResponse::ok(record))
}

#[instrument(skip(state))]
pub async fn remove(state: AppState, kind: EntityKind, id: String) -> ApiResult<Record> {
  let record = state
    .primary
    .delete_by_id(kind, &id)?
    .ok_or_else(|| ApiError::not_found(format!("{} {}", kind, id)))?;
  Ok(ApiResponse::ok(record))
}

#[derive(Debug, Serialize)]
pub struct Health {
  pub online: bool,
  pub primary: ReadyState,
  pub secondary: Option<ReadyState>,
}

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<Health>> {
  ApiResponse::ok(Health {
    online: state.replication.connectivity.is_online(),
    primary: state.primary.ready_state(),
    secondary: state.replication.replicator.secondary_state(),
  })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectivityUpdate {
  pub online: bool,
}

pub async fn set_connectivity(
  State(state): State<AppState>,
  Json(update): Json<ConnectivityUpdate>,
) -> Json<ApiResponse<ConnectivityUpdate>> {
  state
    .replication
    .connectivity
    .set_online(update.online);
  info!(online = update.online, "connectivity set by operator");
  ApiResponse::ok(ConnectivityUpdate {
    online: update.online,
  })
}
