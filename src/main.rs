//! Market-data failover proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                MARKET PROXY                  │
//!                        │                                              │
//!   Client Request       │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ─────────────────────┼─▶│  http  │──▶│ upstream │──▶│   proxy   │──┼──▶ Upstream
//!                        │  │ server │   │ selector │   │ forwarder │  │    (market-data API)
//!                        │  └────────┘   └────┬─────┘   └─────┬─────┘  │
//!                        │                    │               │        │
//!                        │               ┌────▼─────┐         │        │
//!                        │               │  probe   │         │        │
//!                        │               │ (ping)   │         │        │
//!                        │               └──────────┘         │        │
//!   Client Response      │  ┌────────┐                  ┌─────▼─────┐  │
//!   ◀────────────────────┼──│ relay  │◀─────────────────│  outcome  │  │
//!                        │  └────────┘                  └───────────┘  │
//!                        │                                              │
//!                        │  Cross-cutting: config, observability,       │
//!                        │  lifecycle (shutdown, keep-alive self-ping)  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use url::Url;

use market_proxy::config::load_config;
use market_proxy::http::HttpServer;
use market_proxy::lifecycle::{SelfPinger, Shutdown};
use market_proxy::observability;

#[derive(Parser, Debug)]
#[command(name = "market-proxy", about = "Failover proxy for market-data endpoints")]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus the PORT, SELF_URL
    /// and UPSTREAM_BASES environment variables apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    observability::logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "market-proxy starting");
    tracing::info!(
        port = config.listener.port,
        upstreams = config.upstreams.bases.len(),
        strategy = ?config.selector.strategy,
        relay_mode = ?config.relay.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    if let Some(raw) = &config.keep_alive.self_url {
        // Validation already vetted the URL; a parse failure here only
        // disables the pinger.
        match Url::parse(raw) {
            Ok(url) => {
                let pinger =
                    SelfPinger::new(url, Duration::from_secs(config.keep_alive.interval_secs));
                let rx = shutdown.subscribe();
                tokio::spawn(async move {
                    pinger.run(rx).await;
                });
            }
            Err(e) => tracing::error!(self_url = %raw, error = %e, "Ignoring bad self URL"),
        }
    }

    let bind = format!("{}:{}", config.listener.bind_address, config.listener.port);
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
