//! Shared fakes for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::baggage::BaggageExt;
use opentelemetry::propagation::TextMapPropagator;

use httpgrpc_bridge::backend::proto::{Header, HttpRequest, HttpResponse};
use httpgrpc_bridge::backend::{BackendFailure, BackendResult, HttpGrpcClient};
use httpgrpc_bridge::observability::tracing::ProtoHeaderExtractor;
use httpgrpc_bridge::observability::TracingHandle;
use httpgrpc_bridge::RequestContext;

/// In-process stand-in for an `httpgrpc` backend.
///
/// Routes:
/// - `/hello` → 200 `world`
/// - `/error500` → failure carrying 500 `server error message\n`
/// - `/error400` → failure carrying 403 `request error message\n`
/// - `/trace` → 200 with the `name` baggage item it received
/// - `/orgid` → 200 with the `X-Scope-Orgid` it received (exact key)
/// - `/echo` → 200 echoing request headers and body
/// - `/down` → transport failure, no response
/// - `/slow` → 200 `late` after 500ms
/// - `/deadline` → waits for the context deadline, then fails like a
///   timed-out call
#[derive(Clone, Default)]
pub struct FakeBackend {
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn ok(body: impl Into<bytes::Bytes>) -> BackendResult {
    BackendResult::Success(HttpResponse {
        code: 200,
        headers: vec![Header::new("Content-Type", vec!["text/plain".into()])],
        body: body.into(),
    })
}

fn embedded(code: i32, body: &'static str) -> BackendResult {
    let response = HttpResponse {
        code,
        headers: vec![Header::new("Content-Type", vec!["text/plain; charset=utf-8".into()])],
        body: body.into(),
    };
    BackendResult::Failure(BackendFailure::with_response(
        format!("rpc error: code = {code}"),
        response,
    ))
}

/// Exact key lookup, as a Go server's `header[key]` map does after copying.
fn header<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.key == key)
        .and_then(|h| h.values.first())
        .map(String::as_str)
}

#[async_trait]
impl HttpGrpcClient for FakeBackend {
    async fn handle(&self, ctx: &RequestContext, request: HttpRequest) -> BackendResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match request.url.as_str() {
            "/hello" => ok("world"),
            "/error500" => embedded(500, "server error message\n"),
            "/error400" => embedded(403, "request error message\n"),
            "/trace" => {
                let cx = TracingHandle::disabled()
                    .propagator()
                    .extract(&ProtoHeaderExtractor(&request.headers));
                let name = cx
                    .baggage()
                    .get("name")
                    .map(|v| v.as_str().to_string())
                    .unwrap_or_default();
                ok(name)
            }
            "/orgid" => {
                // let other requests interleave before answering
                tokio::task::yield_now().await;
                ok(header(&request, "X-Scope-Orgid").unwrap_or_default().to_string())
            }
            "/echo" => BackendResult::Success(HttpResponse {
                code: 200,
                headers: request.headers.clone(),
                body: request.body.clone(),
            }),
            "/down" => BackendResult::Failure(BackendFailure::transport(
                "connection error: connection refused",
            )),
            "/deadline" => {
                if let Some(deadline) = ctx.deadline() {
                    tokio::time::sleep_until(deadline).await;
                }
                BackendResult::Failure(BackendFailure::transport("context deadline exceeded"))
            }
            "/slow" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                ok("late")
            }
            _ => BackendResult::Success(HttpResponse {
                code: 404,
                headers: Vec::new(),
                body: "not found".into(),
            }),
        }
    }
}
