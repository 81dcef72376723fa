use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::model::{Product, Transaction};

/// Products with stock strictly between zero and this are "low".
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Today's figures shown on the owner dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
  pub today_sales: f64,
  pub transaction_count: usize,
  pub average_transaction: f64,
  pub low_stock_count: usize,
}

impl DashboardStats {
  /// Aggregate sales made on `day` (as seen in `tz`) and current stock levels.
  ///
  /// Voided transactions and returns are left out of the sales figures.
  pub fn compute<Tz: TimeZone>(
    transactions: &[Transaction],
    products: &[Product],
    day: NaiveDate,
    tz: &Tz,
  ) -> Self {
    let todays = transactions
      .iter()
      .filter(|tx| tx.created_at.with_timezone(tz).date_naive() == day)
      .filter(|tx| tx.counts_as_sale());

    let (today_sales, transaction_count) =
      todays.fold((0.0, 0usize), |(sum, count), tx| (sum + tx.total, count + 1));

    let average_transaction = if transaction_count > 0 {
      today_sales / transaction_count as f64
    } else {
      0.0
    };

    let low_stock_count = products
      .iter()
      .filter(|p| p.stock > 0 && p.stock < LOW_STOCK_THRESHOLD)
      .count();

    Self {
      today_sales,
      transaction_count,
      average_transaction,
      low_stock_count,
    }
  }
}
