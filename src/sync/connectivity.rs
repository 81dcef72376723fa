use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::db::{DocumentStore, ReadyState};

/// Shared "are we online" flag consulted before mirroring writes.
#[derive(Debug, Clone)]
pub struct Connectivity {
  online: Arc<AtomicBool>,
}

impl Connectivity {
  pub fn new(online: bool) -> Self {
    Self {
      online: Arc::new(AtomicBool::new(online)),
    }
  }

  pub fn is_online(&self) -> bool {
    self.online.load(Ordering::SeqCst)
  }

  /// Set the flag, returning the previous value.
  pub fn set_online(&self, online: bool) -> bool {
    let previous = self.online.swap(online, Ordering::SeqCst);
    if previous != online {
      if online {
        info!("connectivity restored, local mirroring enabled");
      } else {
        warn!("connectivity lost, local mirroring paused");
      }
    }
    previous
  }
}

/// Periodically follows the primary store's ready state.
///
/// The flag only moves when the observed state changes, so a manual override
/// holds until the primary connection actually goes up or down.
pub struct ConnectivityProbe {
  primary: Arc<dyn DocumentStore>,
  connectivity: Connectivity,
  interval: Duration,
  last: Option<ReadyState>,
}

impl ConnectivityProbe {
  pub fn new(primary: Arc<dyn DocumentStore>, connectivity: Connectivity, interval: Duration) -> Self {
    let last = Some(primary.ready_state());
    Self {
      primary,
      connectivity,
      interval,
      last,
    }
  }

  /// Check the primary once. Returns true if the flag was changed.
  pub fn observe(&mut self) -> bool {
    let state = self.primary.ready_state();
    if self.last == Some(state) {
      return false;
    }

    self.last = Some(state);
    let online = state == ReadyState::Connected;
    self.connectivity.set_online(online) != online
  }

  pub fn spawn(mut self) -> JoinHandle<()> {
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(self.interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
      loop {
        ticker.tick().await;
        self.observe();
      }
    })
  }
}
