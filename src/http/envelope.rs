use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use serde_json::json;

use crate::db::StoreError;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
  pub success: bool,
  pub data: T,
}

impl<T> ApiResponse<T> {
  pub fn ok(data: T) -> Json<Self> {
    Json(Self {
      success: true,
      data,
    })
  }
}

/// Error rendered as `{ "success": false, "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
  status: StatusCode,
  message: String,
}

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status,
      message: message.into(),
    }
  }

  pub fn not_found(what: impl std::fmt::Display) -> Self {
    Self::new(StatusCode::NOT_FOUND, format!("{} not found", what))
  }
}

impl From<StoreError> for ApiError {
  fn from(err: StoreError) -> Self {
    let status = match &err {
      StoreError::Disconnected => StatusCode::SERVICE_UNAVAILABLE,
      StoreError::InvalidDocument => StatusCode::BAD_REQUEST,
      StoreError::Duplicate { .. } => StatusCode::CONFLICT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self::new(status, err.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({
      "success": false,
      "error": self.message,
    });
    (self.status, Json(body)).into_response()
  }
}
