//! Typed views over stored documents.
//!
//! Documents are schemaless on the backend; these types only pick out the
//! fields the client needs. Unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product as listed in the catalogue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
  #[serde(rename = "_id", default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sku: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub brand: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub stock: i64,
}

/// Sale or return rung up at the till
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
  #[serde(rename = "_id", default)]
  pub id: String,
  #[serde(default)]
  pub total: f64,
  #[serde(default)]
  pub status: TransactionStatus,
  #[serde(rename = "type", default)]
  pub kind: TransactionKind,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
  #[default]
  Completed,
  Pending,
  Voided,
  #[serde(other)]
  Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
  #[default]
  Sale,
  Return,
  #[serde(other)]
  Other,
}

impl Transaction {
  /// Whether the transaction contributes to sales figures
  pub fn counts_as_sale(&self) -> bool {
    self.status != TransactionStatus::Voided && self.kind != TransactionKind::Return
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brand {
  #[serde(rename = "_id", default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
  #[serde(rename = "_id", default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
}
