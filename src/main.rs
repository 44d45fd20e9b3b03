//! Rule-based path-rewriting dev proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                  DEV PROXY                    │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ routing  │───▶│ forward  │──┼──▶ Upstream
//!                         │  │ server  │    │ (prefix) │    │(rewrite) │  │
//!                         │  └────┬────┘    └────┬─────┘    └────┬─────┘  │
//!                         │       │ no match     │               │        │
//!                         │       ▼              ▼               ▼        │
//!     Client Response     │  static dir / 404    status, headers, body    │
//!     ◀───────────────────┼───────────────── or mapped 502 / 504 ◀───────┼─── Upstream
//!                         │                                               │
//!                         │  config · observability · lifecycle · admin   │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dev_proxy::config::{lint_rules, load_config};
use dev_proxy::lifecycle::{spawn_signal_handler, Shutdown};
use dev_proxy::observability::{logging, metrics};
use dev_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "dev-proxy")]
#[command(about = "Path-rewriting reverse proxy for local development", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "dev-proxy.toml")]
    config: PathBuf,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("dev-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %args.config.display(),
        bind_address = %config.listener.bind_address,
        rules = config.rules.len(),
        upstream_timeout_secs = ?config.timeouts.upstream_secs,
        "Configuration loaded"
    );
    for warning in lint_rules(&config.rules) {
        tracing::warn!("{}", warning);
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
