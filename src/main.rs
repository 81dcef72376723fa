use chrono::Duration;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use tillsync::client::{ApiClient, Collection, DataStore};
use tillsync::config::Config;
use tillsync::{logging, server};

#[derive(Parser, Debug)]
#[command(name = "tillsync")]
#[command(about = "Point-of-sale backend with local write mirroring")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tillsync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the backend API
  Serve {
    /// Address to listen on, overrides the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Start with local mirroring paused
    #[arg(long)]
    offline: bool,
  },
  /// Print today's dashboard figures
  Dashboard {
    /// Bypass the cache
    #[arg(short, long)]
    refresh: bool,
  },
  /// Print a collection as JSON
  List {
    /// products, transactions, brands, categories or dashboard-stats
    collection: Collection,

    /// Bypass the cache
    #[arg(short, long)]
    refresh: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.logging, &Config::data_dir()?)?;

  match args.command {
    Command::Serve { listen, offline } => {
      if let Some(listen) = listen {
        config.server.listen = listen;
      }
      if offline {
        config.sync.start_online = false;
      }
      server::run(config).await
    }
    Command::Dashboard { refresh } => {
      let store = data_store(&config)?;
      print_json(&store.dashboard_stats(refresh).await.data)
    }
    Command::List {
      collection,
      refresh,
    } => {
      let store = data_store(&config)?;
      match collection {
        Collection::Products => print_json(&store.products(refresh).await.data),
        Collection::Transactions => print_json(&store.transactions(refresh).await.data),
        Collection::Brands => print_json(&store.brands(refresh).await.data),
        Collection::Categories => print_json(&store.categories(refresh).await.data),
        Collection::DashboardStats => print_json(&store.dashboard_stats(refresh).await.data),
      }
    }
  }
}

fn data_store(config: &Config) -> Result<DataStore<ApiClient>> {
  let api = ApiClient::new(&config.client.base_url)?;
  Ok(DataStore::new(api).with_stale_time(Duration::seconds(config.client.cache_ttl_secs)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
