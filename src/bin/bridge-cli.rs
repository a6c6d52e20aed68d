//! Send a single request through the bridge and print the response.
//!
//! ```text
//! SERVER_URL=localhost:9095 bridge-cli --org-id 1 /hello
//! bridge-cli --server-url localhost:9095 --baggage name=tracedata /trace
//! ```

use std::io::Write;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use clap::Parser;
use opentelemetry::{baggage::BaggageExt, Context, KeyValue};
use tokio::time::Instant;

use httpgrpc_bridge::config::{BridgeConfig, LogFormat, ObservabilityConfig};
use httpgrpc_bridge::observability::{logging::init_logging, TracingHandle};
use httpgrpc_bridge::{Bridge, RequestContext};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Send one request to an httpgrpc backend", long_about = None)]
struct Cli {
    /// Backend address (`host:port`, `direct://...`, `dns:///...`).
    #[arg(long, env = "SERVER_URL")]
    server_url: String,

    /// Org ID to send the request as.
    #[arg(long, default_value = "1")]
    org_id: String,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Extra header, `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Baggage item `key=value`; starts a traced span when given. Repeatable.
    #[arg(long)]
    baggage: Vec<String>,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Request path, e.g. `/hello`.
    path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(&ObservabilityConfig {
        log_filter: "warn".to_string(),
        log_format: LogFormat::Text,
        ..ObservabilityConfig::default()
    });

    let mut config = BridgeConfig::default();
    config.backend.address = cli.server_url.clone();

    let telemetry = if cli.baggage.is_empty() {
        TracingHandle::disabled()
    } else {
        TracingHandle::with_tracer("bridge-cli")
    };
    let bridge = Bridge::connect(&config, &telemetry).await?;

    let mut builder = Request::builder().method(cli.method.as_str()).uri(&cli.path);
    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header {header:?} is not `Name: value`"))?;
        builder = builder.header(name.trim(), value.trim());
    }
    let request = builder.body(cli.data.map(Body::from).unwrap_or_else(Body::empty))?;

    let mut ctx = RequestContext::new()
        .with_tenant(cli.org_id)
        .with_deadline(Instant::now() + Duration::from_secs(cli.timeout_secs));
    if !cli.baggage.is_empty() {
        let items = cli
            .baggage
            .iter()
            .map(|item| {
                item.split_once('=')
                    .map(|(k, v)| KeyValue::new(k.to_string(), v.to_string()))
                    .ok_or_else(|| format!("baggage {item:?} is not `key=value`"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(trace) = telemetry.start_span("bridge-cli", &Context::new().with_baggage(items)) {
            ctx = ctx.with_trace(trace);
        }
    }

    let response = bridge.serve(&ctx, request).await;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    eprintln!("{status}");
    std::io::stdout().write_all(&body)?;
    std::io::stdout().flush()?;

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
