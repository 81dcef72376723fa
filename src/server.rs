//! Backend process: opens both stores, wires the interceptor and serves the API.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{DocumentStore, SqliteStore};
use crate::http;
use crate::sync::{Connectivity, ConnectivityProbe, ReplicationState, Replicator};

/// Open the primary and (optional) secondary stores.
///
/// A secondary store that fails to open is logged and left out; the backend
/// keeps serving from the primary alone.
pub fn open_stores(
  config: &Config,
) -> Result<(Arc<dyn DocumentStore>, Option<Arc<dyn DocumentStore>>)> {
  let primary_path = config.primary_path()?;
  let primary = SqliteStore::open(&primary_path).map_err(|e| {
    eyre!(
      "Failed to open primary store at {}: {}",
      primary_path.display(),
      e
    )
  })?;
  info!(path = %primary_path.display(), "primary store connected");

  let secondary = match config.secondary_path()? {
    Some(path) => match SqliteStore::open(&path) {
      Ok(store) => {
        info!(path = %path.display(), "local store connected");
        Some(Arc::new(store) as Arc<dyn DocumentStore>)
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "local store unavailable, mirroring disabled");
        None
      }
    },
    None => None,
  };

  Ok((Arc::new(primary), secondary))
}

/// Run the backend until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
  let (primary, secondary) = open_stores(&config)?;

  let connectivity = Connectivity::new(config.sync.start_online);
  if config.sync.probe_interval_secs > 0 {
    ConnectivityProbe::new(
      Arc::clone(&primary),
      connectivity.clone(),
      Duration::from_secs(config.sync.probe_interval_secs),
    )
    .spawn();
  }

  let replication = ReplicationState::new(connectivity, Replicator::new(secondary))
    .with_body_limit(config.server.body_limit);
  let app = http::router(primary, replication);

  let listener = tokio::net::TcpListener::bind(config.server.listen)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", config.server.listen, e))?;
  info!(addr = %config.server.listen, "listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| eyre!("Server error: {}", e))?;

  info!("shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
