//! Error types for the bridge.
//!
//! Every variant is resolved to a concrete HTTP response at the handler
//! boundary; nothing here is re-raised to the hosting server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::address::AddressError;

/// Errors raised while translating a request or building the backend channel.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The inbound body could not be fully read (stream error, truncation, limit).
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// The request context carries no org ID.
    #[error("no org id")]
    MissingTenant,

    /// The org ID cannot be carried in an HTTP header.
    #[error("org id {0:?} is not a valid header value")]
    InvalidTenant(String),

    /// The inbound request already names a different org ID.
    #[error("different org ID already set: {existing} != {requested}")]
    TenantMismatch { existing: String, requested: String },

    /// The backend response carried a status code HTTP cannot express.
    #[error("invalid response status code {0}")]
    InvalidStatus(i32),

    /// The backend response carried a header name or value HTTP cannot express.
    #[error("invalid response header {key:?}")]
    InvalidHeader { key: String },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("unsupported resolver scheme {0:?}")]
    UnsupportedResolver(String),

    #[error("failed to resolve backend {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build backend channel: {0}")]
    Channel(#[from] tonic::transport::Error),
}

impl BridgeError {
    /// Status code written back to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::Body(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
