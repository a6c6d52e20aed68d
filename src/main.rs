//! httpgrpc-bridge
//!
//! Serves HTTP and forwards every request to an `httpgrpc` backend.
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!   HTTP request   │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │   gRPC
//!  ────────────────┼─▶│ server │──▶│  tenant  │──▶│     bridge     │──┼──────────▶ backend
//!                  │  │ (axum) │   │ context  │   │ translate/call │  │  Handle()
//!  ◀───────────────┼──│        │◀──│          │◀──│ unpack result  │◀─┼───────────
//!   HTTP response  │  └────────┘   └──────────┘   └────────────────┘  │
//!                  └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use httpgrpc_bridge::config::{loader::read_config, validate_config, BridgeConfig, ConfigError};
use httpgrpc_bridge::observability::{logging::init_logging, metrics, TracingHandle};
use httpgrpc_bridge::{Bridge, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "httpgrpc-bridge")]
#[command(about = "Forward HTTP requests to an httpgrpc backend", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Backend address, overrides `backend.address`.
    #[arg(long, env = "SERVER_URL")]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(server_url) = args.server_url {
        config.backend.address = server_url;
    }

    init_logging(&config.observability);

    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            tracing::error!(error = %e, "Invalid configuration");
        }
        return Err(ConfigError::Validation(errors).into());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.address,
        request_timeout_secs = config.timeouts.request_secs,
        tracing_enabled = config.observability.tracing_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(error = %e, "Failed to parse metrics address"),
        }
    }

    let telemetry = TracingHandle::from_config(&config.observability);
    let bridge = Bridge::connect(&config, &telemetry).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, bridge, telemetry)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
