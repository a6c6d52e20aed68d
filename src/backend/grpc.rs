//! tonic implementation of [`HttpGrpcClient`].
//!
//! # Responsibilities
//! - Build the channel from a parsed backend address
//! - Attach org ID and trace metadata to each call
//! - Bound each call by the inbound deadline
//! - Unpack embedded responses from failed calls

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::propagation::{Injector, TextMapPropagator};
use prost::Message;
use tokio::time::Instant;
use tonic::{
    codec::ProstCodec,
    codegen::http::uri::PathAndQuery,
    metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap},
    transport::{Channel, Endpoint},
    Status,
};

use crate::backend::address::{parse_address, Target};
use crate::backend::proto::{HttpRequest, HttpResponse, RpcStatus, HANDLE_PATH};
use crate::backend::{BackendFailure, BackendResult, HttpGrpcClient};
use crate::config::BackendConfig;
use crate::context::{RequestContext, ORG_ID_METADATA};
use crate::error::BridgeError;
use crate::observability::tracing::TracingHandle;

const DEADLINE_EXCEEDED: &str = "context deadline exceeded";

/// A backend reached over a tonic channel.
///
/// Cloning is cheap; all clones share the same connection pool.
#[derive(Clone)]
pub struct GrpcBackend {
    channel: Channel,
    target: Target,
    propagator: Option<Arc<dyn TextMapPropagator + Send + Sync>>,
}

impl GrpcBackend {
    /// Build a channel for `config.address`.
    ///
    /// Direct addresses connect lazily. `dns:///host:port` targets are resolved
    /// once and balanced round-robin across every returned address.
    pub async fn connect(
        config: &BackendConfig,
        telemetry: &TracingHandle,
    ) -> Result<Self, BridgeError> {
        let target = parse_address(&config.address)?;
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);

        let channel = match &target {
            Target::Direct(addr) => endpoint(addr, connect_timeout)?.connect_lazy(),
            Target::PassThrough(raw) => {
                let addrs = resolve(raw).await?;
                let endpoints = addrs
                    .iter()
                    .map(|addr| endpoint(&addr.to_string(), connect_timeout))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::debug!(backend = %raw, endpoints = endpoints.len(), "Resolved backend target");
                Channel::balance_list(endpoints.into_iter())
            }
        };

        tracing::info!(
            backend = %target,
            connect_timeout_secs = config.connect_timeout_secs,
            "Backend channel ready"
        );

        Ok(Self {
            channel,
            target,
            propagator: telemetry.enabled().then(|| telemetry.propagator()),
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    async fn unary(
        &self,
        request: tonic::Request<HttpRequest>,
    ) -> Result<tonic::Response<HttpResponse>, Status> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("backend not ready: {e}")))?;
        let codec: ProstCodec<HttpRequest, HttpResponse> = ProstCodec::default();
        grpc.unary(request, PathAndQuery::from_static(HANDLE_PATH), codec)
            .await
    }
}

#[async_trait]
impl HttpGrpcClient for GrpcBackend {
    async fn handle(&self, ctx: &RequestContext, request: HttpRequest) -> BackendResult {
        let mut call = tonic::Request::new(request);

        let Some(tenant) = ctx.tenant() else {
            return BackendResult::Failure(BackendFailure::transport("no org id"));
        };
        // the forwarded X-Scope-Orgid header is authoritative; metadata is a copy
        match AsciiMetadataValue::try_from(tenant.as_bytes()) {
            Ok(value) => {
                call.metadata_mut().insert(ORG_ID_METADATA, value);
            }
            Err(_) => {
                tracing::warn!(org_id = %tenant, "Org ID is not valid gRPC metadata, sending header only");
            }
        }

        if let (Some(propagator), Some(cx)) = (&self.propagator, ctx.active_span()) {
            propagator.inject_context(cx, &mut MetadataInjector(call.metadata_mut()));
        }

        let remaining = match ctx.deadline() {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return BackendResult::Failure(BackendFailure::transport(DEADLINE_EXCEEDED));
                }
                call.set_timeout(remaining);
                Some(remaining)
            }
            None => None,
        };

        let result = match remaining {
            Some(remaining) => match tokio::time::timeout(remaining, self.unary(call)).await {
                Ok(result) => result,
                Err(_) => {
                    return BackendResult::Failure(BackendFailure::transport(DEADLINE_EXCEEDED));
                }
            },
            None => self.unary(call).await,
        };

        match result {
            Ok(response) => BackendResult::Success(response.into_inner()),
            Err(status) => BackendResult::Failure(BackendFailure {
                response: response_from_status(&status),
                message: status.message().to_string(),
            }),
        }
    }
}

/// Recover the [`HttpResponse`] a backend packed into a failed call's status.
///
/// The details must be a `google.rpc.Status` with exactly one
/// `httpgrpc.HTTPResponse` entry.
pub fn response_from_status(status: &Status) -> Option<HttpResponse> {
    let details = status.details();
    if details.is_empty() {
        return None;
    }

    let decoded = RpcStatus::decode(details).ok()?;
    match decoded.details.as_slice() {
        [any] if any.type_url.ends_with("httpgrpc.HTTPResponse") => {
            HttpResponse::decode(any.value.as_slice()).ok()
        }
        _ => None,
    }
}

fn endpoint(addr: &str, connect_timeout: Duration) -> Result<Endpoint, BridgeError> {
    Ok(Endpoint::from_shared(format!("http://{addr}"))?.connect_timeout(connect_timeout))
}

async fn resolve(raw: &str) -> Result<Vec<SocketAddr>, BridgeError> {
    let Some((scheme, host)) = raw.split_once(":///") else {
        return Err(BridgeError::UnsupportedResolver(raw.to_string()));
    };
    if scheme != "dns" {
        return Err(BridgeError::UnsupportedResolver(scheme.to_string()));
    }

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(host)
        .await
        .map_err(|source| BridgeError::Resolve {
            target: raw.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(BridgeError::Resolve {
            target: raw.to_string(),
            source: std::io::Error::other("no addresses returned"),
        });
    }
    Ok(addrs)
}

/// Writes propagator fields into gRPC metadata, skipping anything that is not
/// valid ASCII metadata.
struct MetadataInjector<'a>(&'a mut MetadataMap);

impl Injector for MetadataInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(key), Ok(value)) = (
            AsciiMetadataKey::from_bytes(key.as_bytes()),
            AsciiMetadataValue::try_from(value.as_str()),
        ) {
            self.0.insert(key, value);
        }
    }
}
