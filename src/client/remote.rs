use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use crate::model::EntityKind;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("fetch failed: {0}")]
  FetchFailed(#[from] reqwest::Error),
  #[error("server rejected request ({status}): {message}")]
  Rejected { status: u16, message: String },
  #[error("unexpected response: {0}")]
  Decode(String),
  #[error("invalid url: {0}")]
  InvalidUrl(#[from] url::ParseError),
  #[error("{0} unavailable")]
  Unavailable(&'static str),
}

/// Backend operations the client data layer depends on.
pub trait RemoteApi: Send + Sync {
  fn list<T>(&self, kind: EntityKind) -> impl Future<Output = Result<Vec<T>, ClientError>> + Send
  where
    T: DeserializeOwned + Send;

  fn create(
    &self,
    kind: EntityKind,
    data: Value,
  ) -> impl Future<Output = Result<Value, ClientError>> + Send;

  fn update(
    &self,
    kind: EntityKind,
    id: &str,
    data: Value,
  ) -> impl Future<Output = Result<Value, ClientError>> + Send;

  fn delete(&self, kind: EntityKind, id: &str)
    -> impl Future<Output = Result<Value, ClientError>> + Send;
}
