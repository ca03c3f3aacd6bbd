//! WinScan gateway
//!
//! Serves the explorer API routes from a local cache, fetching from an ordered
//! list of backend endpoints on a miss.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ route handler (param validation)
//!                                          │
//!                                          ▼
//!                                   ResilientClient
//!                          ┌───────────────┼────────────────┐
//!                          ▼               ▼                ▼
//!                    ResponseCache    Deduplicator   FailoverDispatcher ──▶ Backends
//!                   (TTL + SWR)      (in-flight)     (primary, fallbacks)
//!
//!     Cross-cutting: config (TOML + env), observability (tracing, prometheus),
//!                    admin API, lifecycle (signals, graceful shutdown)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use winscan_gateway::config::load_config;
use winscan_gateway::lifecycle::wait_for_shutdown_signal;
use winscan_gateway::observability::{logging, metrics};
use winscan_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "winscan-gateway")]
#[command(about = "Caching, failover gateway for the WinScan explorer API", long_about = None)]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "winscan-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoints = config.upstream.endpoints.len(),
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::from_config(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
