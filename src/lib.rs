//! HTTP to gRPC bridge library.
//!
//! Accepts HTTP requests and forwards them as `httpgrpc.HTTP/Handle` calls,
//! carrying the org ID and trace context across.

pub mod backend;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use backend::{BackendFailure, BackendResult, GrpcBackend, HttpGrpcClient};
pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use context::RequestContext;
pub use error::BridgeError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
