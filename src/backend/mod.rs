//! Backend transport subsystem.
//!
//! # Data Flow
//! ```text
//! backend address (config / SERVER_URL)
//!     → address.rs (direct / pass-through target)
//!     → grpc.rs (tonic channel, round-robin over resolved addrs)
//!     → HttpGrpcClient::handle(ctx, HttpRequest)
//!     → BackendResult (success, or failure with optional embedded response)
//! ```
//!
//! # Design Decisions
//! - The bridge only sees the `HttpGrpcClient` trait; pooling, balancing and
//!   resolution stay inside the implementation
//! - Failures are values, not errors: the embedded response is an explicit
//!   `Option` and unpacking it is a plain match
//! - No retries at this layer

pub mod address;
pub mod grpc;
pub mod proto;

use async_trait::async_trait;

use crate::context::RequestContext;

pub use address::{parse_address, AddressError, Target};
pub use grpc::{response_from_status, GrpcBackend};
pub use proto::{Header, HttpRequest, HttpResponse};

/// Outcome of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResult {
    Success(HttpResponse),
    Failure(BackendFailure),
}

/// A failed backend call.
///
/// `response` is set when the backend reported an application-level status
/// (4xx/5xx) through the failure channel; `None` means the call itself failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendFailure {
    pub message: String,
    pub response: Option<HttpResponse>,
}

impl BackendFailure {
    /// A failure with no recoverable response (connection lost, timeout, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    /// A failure that carries the backend's own response.
    pub fn with_response(message: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            message: message.into(),
            response: Some(response),
        }
    }
}

/// The call primitive the bridge forwards requests through.
///
/// Implementations must be safe to call concurrently and should honour the
/// deadline carried by `ctx`.
#[async_trait]
pub trait HttpGrpcClient: Send + Sync {
    async fn handle(&self, ctx: &RequestContext, request: HttpRequest) -> BackendResult;
}
