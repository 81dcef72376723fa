//! Client data layer: API access plus the per-collection fetch cache.

mod api;
mod remote;
mod stats;
mod store;

use std::fmt;
use std::str::FromStr;

use crate::model::EntityKind;

pub use api::ApiClient;
pub use remote::{ClientError, RemoteApi};
pub use stats::{DashboardStats, LOW_STOCK_THRESHOLD};
pub use store::DataStore;

/// A cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Products,
  Transactions,
  Brands,
  Categories,
  DashboardStats,
}

impl Collection {
  pub const ALL: [Collection; 5] = [
    Collection::Products,
    Collection::Transactions,
    Collection::Brands,
    Collection::Categories,
    Collection::DashboardStats,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Products => "products",
      Self::Transactions => "transactions",
      Self::Brands => "brands",
      Self::Categories => "categories",
      Self::DashboardStats => "dashboard-stats",
    }
  }

  /// The cached collection backed by records of `kind`, if any.
  pub fn for_kind(kind: EntityKind) -> Option<Self> {
    match kind {
      EntityKind::Product => Some(Self::Products),
      EntityKind::Transaction => Some(Self::Transactions),
      EntityKind::Brand => Some(Self::Brands),
      EntityKind::Category => Some(Self::Categories),
      EntityKind::Employee | EntityKind::StockMovement | EntityKind::Cart => None,
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Collection {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|c| c.name() == s)
      .ok_or_else(|| format!("unknown collection: {}", s))
  }
}

/// What to invalidate: one collection or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
  Collection(Collection),
  All,
}

impl From<Collection> for Invalidation {
  fn from(collection: Collection) -> Self {
    Self::Collection(collection)
  }
}

impl FromStr for Invalidation {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.trim().eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }
    s.parse().map(Self::Collection)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_invalidation() {
    assert_eq!("all".parse::<Invalidation>(), Ok(Invalidation::All));
    assert_eq!(
      "dashboard-stats".parse::<Invalidation>(),
      Ok(Invalidation::Collection(Collection::DashboardStats))
    );
    assert_eq!(
      "Products".parse::<Invalidation>(),
      Ok(Invalidation::Collection(Collection::Products))
    );
    assert!("employees".parse::<Invalidation>().is_err());
  }

  #[test]
  fn test_collection_for_kind() {
    assert_eq!(
      Collection::for_kind(EntityKind::Product),
      Some(Collection::Products)
    );
    assert_eq!(Collection::for_kind(EntityKind::Cart), None);
  }
}
