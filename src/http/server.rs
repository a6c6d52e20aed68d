//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the bridge handler on every path
//! - Wire up middleware (org ID context, tracing, timeouts, request ID)
//! - Bind server to listener and stop on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::context::RequestContext;
use crate::http::middleware::{request_context, TenantPolicy};
use crate::observability::TracingHandle;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Bridge>,
    pub telemetry: TracingHandle,
    pub tenant: Arc<TenantPolicy>,
    pub request_timeout: Duration,
}

/// HTTP front end of the bridge.
pub struct HttpServer {
    router: Router,
    config: BridgeConfig,
}

impl HttpServer {
    /// Create a server forwarding through `bridge`.
    ///
    /// `config` must have passed validation.
    pub fn new(config: BridgeConfig, bridge: Bridge, telemetry: TracingHandle) -> Result<Self, axum::http::header::InvalidHeaderName> {
        let state = AppState {
            bridge: Arc::new(bridge),
            telemetry,
            tenant: Arc::new(TenantPolicy::from_config(&config.tenant)?),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BridgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(bridge_handler))
            .route("/{*path}", any(bridge_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), request_context))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward any request through the bridge.
async fn bridge_handler(State(state): State<AppState>, request: Request) -> Response {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();
    state.bridge.serve(&ctx, request).await
}
