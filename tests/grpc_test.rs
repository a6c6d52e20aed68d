//! `GrpcBackend` against a real tonic server speaking `httpgrpc.HTTP`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tonic::body::BoxBody;
use tonic::codec::ProstCodec;
use tonic::codegen::{http, Body as HttpBody, BoxFuture, Context, Poll, Service, StdError};
use tonic::server::{NamedService, UnaryService};
use tonic::{Code, Status};

use httpgrpc_bridge::backend::proto::{Header, HttpRequest, HttpResponse, HANDLE_PATH};
use httpgrpc_bridge::bridge::ContextPropagator;
use httpgrpc_bridge::config::BackendConfig;
use httpgrpc_bridge::observability::TracingHandle;
use httpgrpc_bridge::{BackendResult, Bridge, GrpcBackend, HttpGrpcClient, RequestContext};

fn forbidden() -> HttpResponse {
    HttpResponse {
        code: 403,
        headers: vec![Header::new("X-A", vec!["b".into()])],
        body: "denied\n".into(),
    }
}

fn text(code: i32, body: String) -> HttpResponse {
    HttpResponse {
        code,
        headers: vec![Header::new("Content-Type", vec!["text/plain".into()])],
        body: body.into(),
    }
}

/// Routes:
/// - `/hello` → 200 `org=<x-scope-orgid metadata>`
/// - `/keys` → 200 with the forwarded header keys, comma separated
/// - `/timeout` → 200 `true` if the call carried `grpc-timeout`
/// - `/forbidden` → error status carrying a 403 response
/// - `/slow` → answers after 5s
async fn handle(request: tonic::Request<HttpRequest>) -> Result<tonic::Response<HttpResponse>, Status> {
    let org_id = request
        .metadata()
        .get("x-scope-orgid")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let has_timeout = request.metadata().contains_key("grpc-timeout");
    let request = request.into_inner();

    let response = match request.url.as_str() {
        "/hello" => text(200, format!("org={org_id}")),
        "/keys" => {
            let keys: Vec<&str> = request.headers.iter().map(|h| h.key.as_str()).collect();
            text(200, keys.join(","))
        }
        "/timeout" => text(200, has_timeout.to_string()),
        "/forbidden" => {
            return Err(Status::with_details(
                Code::Unknown,
                "denied",
                forbidden().to_status_details("denied"),
            ))
        }
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            text(200, "late".into())
        }
        other => return Err(Status::not_found(other.to_string())),
    };
    Ok(tonic::Response::new(response))
}

struct Handle;

impl UnaryService<HttpRequest> for Handle {
    type Response = HttpResponse;
    type Future = BoxFuture<tonic::Response<HttpResponse>, Status>;

    fn call(&mut self, request: tonic::Request<HttpRequest>) -> Self::Future {
        Box::pin(handle(request))
    }
}

#[derive(Clone)]
struct HttpService;

impl NamedService for HttpService {
    const NAME: &'static str = "httpgrpc.HTTP";
}

impl<B> Service<http::Request<B>> for HttpService
where
    B: HttpBody + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        match req.uri().path() {
            HANDLE_PATH => Box::pin(async move {
                let codec: ProstCodec<HttpResponse, HttpRequest> = ProstCodec::default();
                let mut grpc = tonic::server::Grpc::new(codec);
                Ok(grpc.unary(Handle, req).await)
            }),
            _ => Box::pin(async move { Ok(Status::unimplemented("unknown method").into_http()) }),
        }
    }
}

async fn start_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let incoming = futures_util::stream::unfold(listener, |listener| async move {
        let conn = listener.accept().await.map(|(stream, _)| stream);
        Some((conn, listener))
    });

    let handle = tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(HttpService)
            .serve_with_incoming(Box::pin(incoming))
            .await
            .unwrap();
    });
    (addr, handle)
}

async fn connect(addr: SocketAddr) -> GrpcBackend {
    let config = BackendConfig {
        address: addr.to_string(),
        connect_timeout_secs: 1,
    };
    GrpcBackend::connect(&config, &TracingHandle::disabled())
        .await
        .unwrap()
}

fn call(path: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: path.into(),
        headers: Vec::new(),
        body: Default::default(),
    }
}

#[tokio::test]
async fn test_success_carries_org_id_metadata() {
    let (addr, server) = start_server().await;
    let backend = connect(addr).await;

    let ctx = RequestContext::new().with_tenant("team-a");
    let result = backend.handle(&ctx, call("/hello")).await;

    assert_eq!(result, BackendResult::Success(text(200, "org=team-a".into())));
    server.abort();
}

#[tokio::test]
async fn test_embedded_response_unpacked_from_status() {
    let (addr, server) = start_server().await;
    let backend = connect(addr).await;

    let ctx = RequestContext::new().with_tenant("1");
    let BackendResult::Failure(failure) = backend.handle(&ctx, call("/forbidden")).await else {
        panic!("expected failure");
    };

    assert_eq!(failure.message, "denied");
    assert_eq!(failure.response, Some(forbidden()));
    server.abort();
}

#[tokio::test]
async fn test_unknown_path_is_transport_failure() {
    let (addr, server) = start_server().await;
    let backend = connect(addr).await;

    let ctx = RequestContext::new().with_tenant("1");
    let BackendResult::Failure(failure) = backend.handle(&ctx, call("/missing")).await else {
        panic!("expected failure");
    };

    assert_eq!(failure.response, None);
    assert_eq!(failure.message, "/missing");
    server.abort();
}

#[tokio::test]
async fn test_deadline_sent_and_enforced() {
    let (addr, server) = start_server().await;
    let backend = connect(addr).await;

    let ctx = RequestContext::new()
        .with_tenant("1")
        .with_deadline(Instant::now() + Duration::from_secs(5));
    let result = backend.handle(&ctx, call("/timeout")).await;
    assert_eq!(result, BackendResult::Success(text(200, "true".into())));

    let ctx = RequestContext::new()
        .with_tenant("1")
        .with_deadline(Instant::now() + Duration::from_millis(300));
    let start = Instant::now();
    let BackendResult::Failure(failure) = backend.handle(&ctx, call("/slow")).await else {
        panic!("expected failure");
    };

    assert_eq!(failure.response, None);
    assert!(start.elapsed() < Duration::from_secs(2));
    server.abort();
}

#[tokio::test]
async fn test_bridge_over_grpc() {
    let (addr, server) = start_server().await;
    let telemetry = TracingHandle::disabled();
    let bridge = Bridge::new(
        Arc::new(connect(addr).await),
        ContextPropagator::from_handle(&telemetry),
    );
    let ctx = RequestContext::new().with_tenant("team-a");

    let request = Request::builder()
        .uri("/keys")
        .header("Content-Type", "text/plain")
        .body(Body::empty())
        .unwrap();
    let response = bridge.serve(&ctx, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Content-Type,X-Scope-Orgid");

    let request = Request::builder()
        .uri("/forbidden")
        .body(Body::empty())
        .unwrap();
    let response = bridge.serve(&ctx, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["x-a"], "b");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"denied\n");

    server.abort();
}
