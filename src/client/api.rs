//! HTTP client for the backend API.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::remote::{ClientError, RemoteApi};
use crate::model::EntityKind;

/// Backend API client wrapper
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
  #[serde(default)]
  success: bool,
  data: Option<T>,
  error: Option<String>,
}

impl ApiClient {
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    let mut base = Url::parse(base_url)?;

    // Keep any path prefix when joining endpoints onto the base
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()?;

    Ok(Self { http, base })
  }

  fn endpoint(&self, kind: EntityKind, id: Option<&str>) -> Result<Url, ClientError> {
    let path = match id {
      Some(id) => format!("api/{}/{}", kind.route_segment(), id),
      None => format!("api/{}", kind.route_segment()),
    };
    Ok(self.base.join(&path)?)
  }
}

impl RemoteApi for ApiClient {
  async fn list<T>(&self, kind: EntityKind) -> Result<Vec<T>, ClientError>
  where
    T: DeserializeOwned + Send,
  {
    let response = self.http.get(self.endpoint(kind, None)?).send().await?;
    decode(response).await
  }

  async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, ClientError> {
    let response = self
      .http
      .post(self.endpoint(kind, None)?)
      .json(&data)
      .send()
      .await?;
    decode(response).await
  }

  async fn update(&self, kind: EntityKind, id: &str, data: Value) -> Result<Value, ClientError> {
    let response = self
      .http
      .put(self.endpoint(kind, Some(id))?)
      .json(&data)
      .send()
      .await?;
    decode(response).await
  }

  async fn delete(&self, kind: EntityKind, id: &str) -> Result<Value, ClientError> {
    let response = self
      .http
      .delete(self.endpoint(kind, Some(id))?)
      .send()
      .await?;
    decode(response).await
  }
}

/// Unwrap a `{ success, data }` response.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
  let status = response.status();
  let bytes = response.bytes().await?;

  if !status.is_success() {
    let message = serde_json::from_slice::<Envelope<Value>>(&bytes)
      .ok()
      .and_then(|envelope| envelope.error)
      .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
    return Err(ClientError::Rejected {
      status: status.as_u16(),
      message,
    });
  }

  let envelope: Envelope<T> =
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;

  if !envelope.success {
    return Err(ClientError::Rejected {
      status: status.as_u16(),
      message: envelope.error.unwrap_or_else(|| "request unsuccessful".to_string()),
    });
  }

  envelope
    .data
    .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_keeps_base_path() {
    let client = ApiClient::new("http://shop.local:4000/backend").unwrap();
    assert_eq!(
      client
        .endpoint(EntityKind::StockMovement, Some("m1"))
        .unwrap()
        .as_str(),
      "http://shop.local:4000/backend/api/stock-movements/m1"
    );
  }

  #[test]
  fn test_endpoint_without_path() {
    let client = ApiClient::new("http://127.0.0.1:4000").unwrap();
    assert_eq!(
      client.endpoint(EntityKind::Product, None).unwrap().as_str(),
      "http://127.0.0.1:4000/api/products"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(matches!(
      ApiClient::new("not a url"),
      Err(ClientError::InvalidUrl(_))
    ));
  }
}
