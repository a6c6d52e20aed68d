//! Per-request context passed explicitly through every layer.

use opentelemetry::trace::TraceContextExt;
use tokio::time::Instant;

/// Header carrying the org ID on the HTTP side.
pub const ORG_ID_HEADER: &str = "X-Scope-OrgID";

/// gRPC metadata key carrying the org ID on the backend call.
pub const ORG_ID_METADATA: &str = "x-scope-orgid";

/// Immutable context of one inbound request.
///
/// Built once by the authentication stage (or the caller) and only read
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    tenant: Option<String>,
    trace: Option<opentelemetry::Context>,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_trace(mut self, trace: opentelemetry::Context) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn trace(&self) -> Option<&opentelemetry::Context> {
        self.trace.as_ref()
    }

    /// The trace context, only if it holds a live span.
    pub fn active_span(&self) -> Option<&opentelemetry::Context> {
        self.trace.as_ref().filter(|cx| cx.has_active_span())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
