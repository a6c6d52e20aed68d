//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend address must use a supported form
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Addresses and header names must parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::backend::address::{parse_address, AddressError};
use crate::config::schema::BridgeConfig;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("backend.address: {0}")]
    BackendAddress(#[source] AddressError),
    #[error("{field} must be a socket address, got {value:?}")]
    SocketAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("tenant.header {0:?} is not a valid header name")]
    TenantHeader(String),
    #[error("tenant.anonymous_tenant must not be empty")]
    EmptyAnonymousTenant,
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_address(&config.backend.address) {
        errors.push(ValidationError::BackendAddress(e));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::SocketAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::SocketAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("backend.connect_timeout_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    if HeaderName::from_bytes(config.tenant.header.as_bytes()).is_err() {
        errors.push(ValidationError::TenantHeader(config.tenant.header.clone()));
    }
    if config.tenant.anonymous_tenant.as_deref() == Some("") {
        errors.push(ValidationError::EmptyAnonymousTenant);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
