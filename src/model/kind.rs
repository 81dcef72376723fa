use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical record type stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Product,
  Transaction,
  Employee,
  StockMovement,
  Cart,
  Brand,
  Category,
}

impl EntityKind {
  pub const ALL: [EntityKind; 7] = [
    EntityKind::Product,
    EntityKind::Transaction,
    EntityKind::Employee,
    EntityKind::StockMovement,
    EntityKind::Cart,
    EntityKind::Brand,
    EntityKind::Category,
  ];

  /// Kinds whose writes are mirrored into the secondary store
  pub const MIRRORED: [EntityKind; 5] = [
    EntityKind::Product,
    EntityKind::Transaction,
    EntityKind::Employee,
    EntityKind::StockMovement,
    EntityKind::Cart,
  ];

  /// Name used as the storage partition (the `kind` column)
  pub fn storage_name(self) -> &'static str {
    match self {
      Self::Product => "products",
      Self::Transaction => "transactions",
      Self::Employee => "employees",
      Self::StockMovement => "stock_movements",
      Self::Cart => "carts",
      Self::Brand => "brands",
      Self::Category => "categories",
    }
  }

  /// Path segment the collection is served under
  pub fn route_segment(self) -> &'static str {
    match self {
      Self::Product => "products",
      Self::Transaction => "transactions",
      Self::Employee => "employees",
      Self::StockMovement => "stock-movements",
      Self::Cart => "carts",
      Self::Brand => "brands",
      Self::Category => "categories",
    }
  }

  pub fn is_mirrored(self) -> bool {
    Self::MIRRORED.contains(&self)
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Product => "Product",
      Self::Transaction => "Transaction",
      Self::Employee => "Employee",
      Self::StockMovement => "StockMovement",
      Self::Cart => "Cart",
      Self::Brand => "Brand",
      Self::Category => "Category",
    };
    f.write_str(name)
  }
}

impl FromStr for EntityKind {
  type Err = String;

  /// Accepts either the route segment or the storage name.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|kind| kind.route_segment() == s || kind.storage_name() == s)
      .ok_or_else(|| format!("unknown collection: {}", s))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_route_segment_and_storage_name() {
    assert_eq!(
      "stock-movements".parse::<EntityKind>(),
      Ok(EntityKind::StockMovement)
    );
    assert_eq!(
      "stock_movements".parse::<EntityKind>(),
      Ok(EntityKind::StockMovement)
    );
    assert_eq!(" Products ".parse::<EntityKind>(), Ok(EntityKind::Product));
    assert!("printers".parse::<EntityKind>().is_err());
  }

  #[test]
  fn test_brands_and_categories_are_not_mirrored() {
    assert!(!EntityKind::Brand.is_mirrored());
    assert!(!EntityKind::Category.is_mirrored());
    assert!(EntityKind::Cart.is_mirrored());
  }
}
