//! HTTP → gRPC bridge.
//!
//! # Data Flow
//! ```text
//! Request<Body> + RequestContext
//!     → propagate.rs (trace headers, X-Scope-OrgID)
//!     → request.rs (HttpRequest payload, body drained once)
//!     → HttpGrpcClient::handle (backend call, inbound deadline)
//!     → response.rs (success / embedded response / plain 500)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - No per-request state outside the call stack; one `Bridge` serves all
//!   requests concurrently
//! - Requests rejected before translation never reach the backend

pub mod propagate;
pub mod request;
pub mod response;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};

use crate::backend::{BackendResult, GrpcBackend, HttpGrpcClient};
use crate::config::BridgeConfig;
use crate::context::RequestContext;
use crate::error::BridgeError;
use crate::observability::{metrics, TracingHandle};

pub use propagate::ContextPropagator;
pub use request::translate;
pub use response::{to_outbound, write_response};

/// Default cap on buffered request bodies.
pub const DEFAULT_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Forwards HTTP requests to an `httpgrpc` backend.
#[derive(Clone)]
pub struct Bridge {
    client: Arc<dyn HttpGrpcClient>,
    propagator: ContextPropagator,
    body_limit: usize,
}

impl Bridge {
    pub fn new(client: Arc<dyn HttpGrpcClient>, propagator: ContextPropagator) -> Self {
        Self {
            client,
            propagator,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Build a bridge over a [`GrpcBackend`] for `config.backend`.
    pub async fn connect(config: &BridgeConfig, telemetry: &TracingHandle) -> Result<Self, BridgeError> {
        let backend = GrpcBackend::connect(&config.backend, telemetry).await?;
        Ok(Self::new(Arc::new(backend), ContextPropagator::from_handle(telemetry))
            .with_body_limit(config.limits.max_body_bytes))
    }

    /// Handle one request. Always produces a response.
    pub async fn serve(&self, ctx: &RequestContext, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();

        let response = self.forward(ctx, request).await;

        metrics::record_request(&method, response.status().as_u16(), start);
        response
    }

    async fn forward(&self, ctx: &RequestContext, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        self.propagator.inject_trace(ctx, &mut parts.headers);

        let tenant = match self.propagator.inject_tenant(ctx, &mut parts.headers) {
            Ok(tenant) => tenant,
            Err(e) => {
                tracing::warn!(error = %e, path = %parts.uri.path(), "Rejecting request");
                return e.into_response();
            }
        };

        let request = match translate(Request::from_parts(parts, body), self.body_limit).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, org_id = %tenant, "Failed to translate request");
                return e.into_response();
            }
        };

        tracing::debug!(
            org_id = %tenant,
            method = %request.method,
            path = %request.url,
            "Forwarding request to backend"
        );

        let result = self.client.handle(ctx, request).await;
        if let BackendResult::Failure(failure) = &result {
            metrics::record_backend_failure(if failure.response.is_some() {
                "embedded"
            } else {
                "transport"
            });
        }

        to_outbound(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use tracing_test::traced_test;

    use crate::backend::proto::HttpRequest;
    use crate::backend::BackendFailure;

    #[derive(Default)]
    struct Refusing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpGrpcClient for Refusing {
        async fn handle(&self, _ctx: &RequestContext, _request: HttpRequest) -> BackendResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            BackendResult::Failure(BackendFailure::transport("connection refused"))
        }
    }

    fn bridge(client: Arc<Refusing>) -> Bridge {
        Bridge::new(client, ContextPropagator::from_handle(&TracingHandle::disabled()))
    }

    fn get() -> Request<Body> {
        Request::builder().uri("/api").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_tenant_logged_and_rejected() {
        let client = Arc::new(Refusing::default());
        let response = bridge(client.clone()).serve(&RequestContext::new(), get()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert!(logs_contain("Rejecting request"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_transport_failure_logged() {
        let client = Arc::new(Refusing::default());
        let ctx = RequestContext::new().with_tenant("1");
        let response = bridge(client.clone()).serve(&ctx, get()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(logs_contain("Backend call failed"));
    }
}
