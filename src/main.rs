//! Caching edge proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   EDGE PROXY                      │
//!   Client Request        │  ┌────────┐   ┌─────────────────────────────┐    │
//!   ──────────────────────┼─▶│  http  │──▶│          pipeline           │    │
//!                         │  │ server │   │ bypass? redirect? cached?   │    │
//!                         │  └────────┘   └──────┬──────────┬───────┬───┘    │
//!                         │                      │          │       │        │
//!                         │                      ▼          ▼       ▼        │
//!                         │               ┌──────────┐ ┌────────┐ ┌──────┐   │
//!                         │               │redirects │ │objects │ │origin│───┼──▶ Origin
//!                         │               │ (kv)     │ │ (blob) │ │client│   │    Server
//!                         │               └──────────┘ └────────┘ └──────┘   │
//!                         │                      ▲          ▲                │
//!                         │               background writes (tracked)        │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_cache_proxy::config::{self, EdgeConfig};
use edge_cache_proxy::observability::{logging, metrics};
use edge_cache_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-cache-proxy")]
#[command(about = "Caching edge proxy with redirect and object stores", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::finish(EdgeConfig::default())?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("edge-cache-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.origin.address,
        backend_enabled = config.origin.enabled,
        storage = ?config.storage.backend,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
