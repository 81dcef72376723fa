//! Best-effort application of mutations to the secondary store.

use axum::http::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::{DocumentStore, ReadyState, StoreError};
use crate::model::EntityKind;

/// Write to repeat against the secondary store.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
  pub kind: EntityKind,
  pub op: MutationOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOp {
  Create { data: Value },
  Upsert { id: String, data: Value },
  Delete { id: String },
}

impl Mutation {
  /// Work out what a successful write request means for the secondary store.
  ///
  /// Updates and deletes without a record id are skipped.
  pub fn plan(method: &Method, kind: EntityKind, id: Option<&str>, data: Value) -> Option<Self> {
    let op = match *method {
      Method::POST => MutationOp::Create { data },
      Method::PUT | Method::PATCH => MutationOp::Upsert {
        id: id?.to_string(),
        data,
      },
      Method::DELETE => MutationOp::Delete {
        id: id?.to_string(),
      },
      _ => return None,
    };

    Some(Self { kind, op })
  }
}

#[derive(Debug, Error)]
pub enum ReplicationError {
  #[error("replication of {kind} failed: {message}")]
  ReplicationFailed { kind: EntityKind, message: String },
}

/// Callback receiving replication failures.
#[derive(Clone)]
pub struct ErrorReporter(Arc<dyn Fn(ReplicationError) + Send + Sync>);

impl ErrorReporter {
  pub fn new(report: impl Fn(ReplicationError) + Send + Sync + 'static) -> Self {
    Self(Arc::new(report))
  }

  pub fn report(&self, error: ReplicationError) {
    (self.0)(error)
  }
}

impl Default for ErrorReporter {
  /// Log the failure and move on.
  fn default() -> Self {
    Self::new(|error| match &error {
      ReplicationError::ReplicationFailed { kind, message } => {
        warn!(%kind, error = %message, "local replication failed");
      }
    })
  }
}

impl fmt::Debug for ErrorReporter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ErrorReporter").finish_non_exhaustive()
  }
}

/// Mirrors mutations into the secondary store on detached tasks.
#[derive(Clone, Default)]
pub struct Replicator {
  secondary: Option<Arc<dyn DocumentStore>>,
  reporter: ErrorReporter,
}

impl Replicator {
  pub fn new(secondary: Option<Arc<dyn DocumentStore>>) -> Self {
    Self {
      secondary,
      reporter: ErrorReporter::default(),
    }
  }

  pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
    self.reporter = reporter;
    self
  }

  /// Ready state of the secondary store, `None` when none is configured.
  pub fn secondary_state(&self) -> Option<ReadyState> {
    self.secondary.as_ref().map(|store| store.ready_state())
  }

  pub fn secondary_ready(&self) -> bool {
    self.secondary_state() == Some(ReadyState::Connected)
  }

  /// Apply `mutation` in the background.
  ///
  /// The returned handle may be dropped; failures go to the reporter and never
  /// reach the caller.
  pub fn spawn(&self, mutation: Mutation) -> Option<JoinHandle<()>> {
    let store = Arc::clone(self.secondary.as_ref()?);
    let reporter = self.reporter.clone();

    Some(tokio::task::spawn_blocking(move || {
      let kind = mutation.kind;
      match apply(store.as_ref(), mutation) {
        Ok(()) => debug!(%kind, "replicated to local store"),
        Err(e) => reporter.report(ReplicationError::ReplicationFailed {
          kind,
          message: e.to_string(),
        }),
      }
    }))
  }
}

/// Perform `mutation` against `store`.
pub fn apply(store: &dyn DocumentStore, mutation: Mutation) -> Result<(), StoreError> {
  match mutation.op {
    MutationOp::Create { data } => {
      store.create(mutation.kind, data)?;
    }
    MutationOp::Upsert { id, data } => {
      store.update_by_id(mutation.kind, &id, data, true)?;
    }
    MutationOp::Delete { id } => {
      store.delete_by_id(mutation.kind, &id)?;
    }
  }
  Ok(())
}
