use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When file logging is
/// on, the returned guard must be held for the life of the process so buffered
/// lines are flushed.
pub fn init(config: &LoggingConfig, data_dir: &Path) -> Result<Option<WorkerGuard>> {
  let env_filter =
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

  let stdout_layer = fmt::layer().compact().with_target(true);

  let (file_layer, guard) = if config.file {
    let appender = tracing_appender::rolling::daily(data_dir.join("logs"), "tillsync.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
      .with_ansi(false)
      .with_writer(writer)
      .boxed();
    (Some(layer), Some(guard))
  } else {
    (None, None)
  };

  tracing_subscriber::registry()
    .with(env_filter)
    .with(stdout_layer)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  Ok(guard)
}
