//! Context propagation: org ID and trace context across the bridge.
//!
//! # Responsibilities
//! - Write the org ID into the forwarded headers (required)
//! - Serialise the active span and baggage into the forwarded headers
//!   (best effort)
//!
//! # Design Decisions
//! - The propagator is handed in at construction, never looked up globally
//! - Trace failures are logged and skipped; only org ID failures reject
//!   the request

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::TextMapPropagator;

use crate::context::RequestContext;
use crate::error::BridgeError;
use crate::observability::tracing::{HeaderInjector, TracingHandle};

#[derive(Clone)]
pub struct ContextPropagator {
    propagator: Arc<dyn TextMapPropagator + Send + Sync>,
    enabled: bool,
}

impl ContextPropagator {
    pub fn new(propagator: Arc<dyn TextMapPropagator + Send + Sync>, enabled: bool) -> Self {
        Self {
            propagator,
            enabled,
        }
    }

    pub fn from_handle(handle: &TracingHandle) -> Self {
        Self::new(handle.propagator(), handle.enabled())
    }

    /// Set `X-Scope-OrgID` from the context, returning the org ID.
    ///
    /// Fails if the context has no org ID, if it cannot be a header value, or
    /// if the request already carries a different one.
    pub fn inject_tenant(&self, ctx: &RequestContext, headers: &mut HeaderMap) -> Result<String, BridgeError> {
        let tenant = ctx.tenant().ok_or(BridgeError::MissingTenant)?;
        // X-Scope-OrgID
        let name = HeaderName::from_static("x-scope-orgid");

        if let Some(existing) = headers.get(&name) {
            let existing = String::from_utf8_lossy(existing.as_bytes());
            if existing != tenant {
                return Err(BridgeError::TenantMismatch {
                    existing: existing.into_owned(),
                    requested: tenant.to_string(),
                });
            }
        }

        // opaque: any bytes a header value can hold, UTF-8 included
        let value = HeaderValue::from_bytes(tenant.as_bytes())
            .map_err(|_| BridgeError::InvalidTenant(tenant.to_string()))?;
        headers.insert(name, value);
        Ok(tenant.to_string())
    }

    /// Serialise the context's active span into `headers`.
    ///
    /// Returns whether anything was injected. Never fails the request.
    pub fn inject_trace(&self, ctx: &RequestContext, headers: &mut HeaderMap) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(cx) = ctx.active_span() else {
            return false;
        };

        let mut injector = HeaderInjector::new(headers);
        self.propagator.inject_context(cx, &mut injector);
        if !injector.rejected().is_empty() {
            tracing::warn!(
                fields = ?injector.rejected(),
                "Failed to inject tracing headers into request"
            );
        }
        true
    }
}
