//! Cached view of the backend collections used by the staff and owner apps.

use chrono::{Duration, Local};
use serde_json::Value;
use tracing::debug;

use super::remote::{ClientError, RemoteApi};
use super::stats::DashboardStats;
use super::{Collection, Invalidation};
use crate::cache::{CacheLayer, CacheResult, CacheSlot, CacheSource};
use crate::model::{Brand, Category, EntityKind, Product, Transaction};

/// Per-collection fetch cache in front of a [`RemoteApi`].
///
/// Screens call the collection methods on focus with `force = false` and on
/// pull-to-refresh with `force = true`.
pub struct DataStore<A> {
  api: A,
  cache: CacheLayer,
  products: CacheSlot<Vec<Product>>,
  transactions: CacheSlot<Vec<Transaction>>,
  brands: CacheSlot<Vec<Brand>>,
  categories: CacheSlot<Vec<Category>>,
  dashboard: CacheSlot<DashboardStats>,
}

impl<A: RemoteApi> DataStore<A> {
  pub fn new(api: A) -> Self {
    Self {
      api,
      cache: CacheLayer::new(),
      products: CacheSlot::new(Collection::Products.name()),
      transactions: CacheSlot::new(Collection::Transactions.name()),
      brands: CacheSlot::new(Collection::Brands.name()),
      categories: CacheSlot::new(Collection::Categories.name()),
      dashboard: CacheSlot::new(Collection::DashboardStats.name()),
    }
  }

  /// Set the stale time for every collection.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.cache = self.cache.with_stale_time(stale_time);
    self
  }

  pub fn api(&self) -> &A {
    &self.api
  }

  pub async fn products(&self, force: bool) -> CacheResult<Vec<Product>> {
    self
      .cache
      .fetch(&self.products, force, || self.api.list(EntityKind::Product))
      .await
  }

  pub async fn transactions(&self, force: bool) -> CacheResult<Vec<Transaction>> {
    self
      .cache
      .fetch(&self.transactions, force, || {
        self.api.list(EntityKind::Transaction)
      })
      .await
  }

  pub async fn brands(&self, force: bool) -> CacheResult<Vec<Brand>> {
    self
      .cache
      .fetch(&self.brands, force, || self.api.list(EntityKind::Brand))
      .await
  }

  pub async fn categories(&self, force: bool) -> CacheResult<Vec<Category>> {
    self
      .cache
      .fetch(&self.categories, force, || self.api.list(EntityKind::Category))
      .await
  }

  /// Today's dashboard figures.
  ///
  /// Cached under its own entry. On a miss it is recomputed from the
  /// transactions and products collections, which are read through their own
  /// caches with the same `force` flag. If either input could not be fetched
  /// the recompute counts as failed, so the last good figures are kept.
  pub async fn dashboard_stats(&self, force: bool) -> CacheResult<DashboardStats> {
    self
      .cache
      .fetch(&self.dashboard, force, || async move {
        let (transactions, products) =
          futures::join!(self.transactions(force), self.products(force));
        if transactions.source == CacheSource::Offline {
          return Err(ClientError::Unavailable(Collection::Transactions.name()));
        }
        if products.source == CacheSource::Offline {
          return Err(ClientError::Unavailable(Collection::Products.name()));
        }

        let today = Local::now().date_naive();
        Ok(DashboardStats::compute(
          &transactions.data,
          &products.data,
          today,
          &Local,
        ))
      })
      .await
  }

  /// Mark collections stale so the next read goes to the network.
  pub fn invalidate(&self, target: Invalidation) {
    match target {
      Invalidation::Collection(collection) => self.invalidate_one(collection),
      Invalidation::All => Collection::ALL
        .into_iter()
        .for_each(|collection| self.invalidate_one(collection)),
    }
  }

  fn invalidate_one(&self, collection: Collection) {
    debug!(collection = collection.name(), "cache invalidated");
    match collection {
      Collection::Products => self.products.invalidate(),
      Collection::Transactions => self.transactions.invalidate(),
      Collection::Brands => self.brands.invalidate(),
      Collection::Categories => self.categories.invalidate(),
      Collection::DashboardStats => self.dashboard.invalidate(),
    }
  }

  /// Create a record and invalidate what it affects.
  pub async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, ClientError> {
    let record = self.api.create(kind, data).await?;
    self.invalidate_after_write(kind);
    Ok(record)
  }

  pub async fn update(&self, kind: EntityKind, id: &str, data: Value) -> Result<Value, ClientError> {
    let record = self.api.update(kind, id, data).await?;
    self.invalidate_after_write(kind);
    Ok(record)
  }

  pub async fn remove(&self, kind: EntityKind, id: &str) -> Result<Value, ClientError> {
    let record = self.api.delete(kind, id).await?;
    self.invalidate_after_write(kind);
    Ok(record)
  }

  fn invalidate_after_write(&self, kind: EntityKind) {
    if let Some(collection) = Collection::for_kind(kind) {
      self.invalidate(Invalidation::Collection(collection));
    }
    if matches!(kind, EntityKind::Product | EntityKind::Transaction) {
      self.invalidate(Invalidation::Collection(Collection::DashboardStats));
    }
  }
}
