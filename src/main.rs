//! Encrypt Relay
//!
//! A CORS relay for the gateway's user-encrypt endpoint, built with Tokio
//! and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                ENCRYPT RELAY                 │
//!   GET /proxy          │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ?usr=..&p29=..  ────┼─▶│  cors  │──▶│ handlers │──▶│ forwarder │──┼──▶ Gateway
//!                       │  │ req-id │   │ (method, │   │ (timeout, │  │    /gateway/user/encrypt
//!   text/plain or   ◀───┼──│ trace  │◀──│  query)  │◀──│ envelope) │◀─┼───
//!   JSON error          │  └────────┘   └──────────┘   └───────────┘  │
//!                       │                                              │
//!                       │  config · observability · lifecycle          │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use encrypt_relay::config::{finalize, load_config};
use encrypt_relay::http::HttpServer;
use encrypt_relay::lifecycle::{signals, Shutdown};
use encrypt_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "encrypt-relay")]
#[command(about = "CORS relay for the user-encrypt gateway", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream base URL (overrides config and RELAY_UPSTREAM_URL).
    #[arg(short, long)]
    upstream: Option<String>,

    /// Bind address (overrides config, RELAY_BIND_ADDRESS and PORT).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(upstream) = args.upstream {
        config.upstream.base_url = upstream;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    let config = finalize(config)?;

    logging::init(&config.observability);

    tracing::info!("encrypt-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        upstream_timeout_ms = config.upstream.timeout_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
