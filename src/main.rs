//! cookie-relay gateway
//!
//! ```text
//!  Client ──▶ trace ─▶ request-id ─▶ timeout ─▶ token relay ─▶ forward ──▶ Upstream
//!                                                   │
//!                                                   └── 400/401 plain-text rejection
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cookie_relay::config::{load_config, GatewayConfig};
use cookie_relay::lifecycle::signals::shutdown_signal;
use cookie_relay::observability::{logging, metrics};
use cookie_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "cookie-relay")]
#[command(about = "Relay a cookie-held access token as a bearer Authorization header", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("cookie-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        cookie_name = %config.relay.cookie_name,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
