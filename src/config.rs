use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_STALE_SECS;
use crate::sync::DEFAULT_BODY_LIMIT;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub server: ServerConfig,
  pub stores: StoresConfig,
  pub sync: SyncConfig,
  pub client: ClientConfig,
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub listen: SocketAddr,
  /// Largest response body the write interceptor will inspect
  pub body_limit: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      listen: SocketAddr::from(([127, 0, 0, 1], 4000)),
      body_limit: DEFAULT_BODY_LIMIT,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoresConfig {
  /// Primary (cloud) database file; defaults to `<data dir>/cloud.db`
  pub primary: Option<PathBuf>,
  /// Secondary (local) database file; defaults to `<data dir>/local.db`
  pub secondary: Option<PathBuf>,
  /// Whether to keep a local mirror at all
  pub mirror: bool,
}

impl Default for StoresConfig {
  fn default() -> Self {
    Self {
      primary: None,
      secondary: None,
      mirror: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Initial value of the online flag
  pub start_online: bool,
  /// Seconds between primary connection checks, 0 disables the probe
  pub probe_interval_secs: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      start_online: true,
      probe_interval_secs: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  pub base_url: String,
  pub cache_ttl_secs: i64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:4000".to_string(),
      cache_ttl_secs: DEFAULT_STALE_SECS,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Default filter when RUST_LOG is unset
  pub level: String,
  /// Also write a daily log file under `<data dir>/logs`
  pub file: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: false,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tillsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tillsync/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("tillsync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tillsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Directory for databases and logs.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("tillsync"))
  }

  pub fn primary_path(&self) -> Result<PathBuf> {
    match &self.stores.primary {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("cloud.db")),
    }
  }

  /// Secondary store path, `None` when mirroring is turned off.
  pub fn secondary_path(&self) -> Result<Option<PathBuf>> {
    if !self.stores.mirror {
      return Ok(None);
    }
    match &self.stores.secondary {
      Some(path) => Ok(Some(path.clone())),
      None => Ok(Some(Self::data_dir()?.join("local.db"))),
    }
  }
}
