//! Org ID authentication middleware.
//! Builds the per-request context the bridge forwards with.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::InvalidHeaderName, HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::config::TenantConfig;
use crate::context::RequestContext;
use crate::http::server::AppState;

/// Backend deadline is this much earlier than the server's request timeout,
/// so backend timeouts reach the caller as a 500 instead of a bare 408.
pub const DEADLINE_HEADROOM: Duration = Duration::from_millis(100);

/// Where the org ID of an inbound request comes from.
#[derive(Debug, Clone)]
pub struct TenantPolicy {
    header: HeaderName,
    anonymous: Option<String>,
}

impl TenantPolicy {
    pub fn from_config(config: &TenantConfig) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(config.header.as_bytes())?,
            anonymous: config.anonymous_tenant.clone(),
        })
    }

    /// Org ID for a request, or the status and message to reject it with.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<String, (StatusCode, &'static str)> {
        match headers.get(&self.header) {
            Some(value) => match value.to_str() {
                Ok(org_id) if !org_id.is_empty() => Ok(org_id.to_string()),
                _ => Err((StatusCode::BAD_REQUEST, "invalid org id")),
            },
            None => self
                .anonymous
                .clone()
                .ok_or((StatusCode::UNAUTHORIZED, "no org id")),
        }
    }
}

/// Attach a [`RequestContext`] (org ID, server span, deadline) to the request.
pub async fn request_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let tenant = match state.tenant.resolve(request.headers()) {
        Ok(tenant) => tenant,
        Err(rejection) => {
            tracing::warn!(
                path = %request.uri().path(),
                reason = rejection.1,
                "Rejecting unauthenticated request"
            );
            return rejection.into_response();
        }
    };

    let mut ctx = RequestContext::new()
        .with_tenant(tenant)
        .with_deadline(Instant::now() + state.request_timeout.saturating_sub(DEADLINE_HEADROOM));
    if let Some(trace) =
        state
            .telemetry
            .start_server_span(request.method(), request.uri().path(), request.headers())
    {
        ctx = ctx.with_trace(trace);
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy(anonymous: Option<&str>) -> TenantPolicy {
        TenantPolicy::from_config(&TenantConfig {
            header: "X-Scope-OrgID".into(),
            anonymous_tenant: anonymous.map(String::from),
        })
        .unwrap()
    }

    #[test]
    fn test_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-scope-orgid", HeaderValue::from_static("team-a"));
        assert_eq!(policy(Some("anonymous")).resolve(&headers), Ok("team-a".to_string()));
    }

    #[test]
    fn test_missing_header_rejected_without_policy() {
        assert_eq!(
            policy(None).resolve(&HeaderMap::new()),
            Err((StatusCode::UNAUTHORIZED, "no org id"))
        );
    }

    #[test]
    fn test_anonymous_policy() {
        assert_eq!(
            policy(Some("anonymous")).resolve(&HeaderMap::new()),
            Ok("anonymous".to_string())
        );
    }

    #[test]
    fn test_empty_header_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("x-scope-orgid", HeaderValue::from_static(""));
        assert_eq!(
            policy(Some("anonymous")).resolve(&headers),
            Err((StatusCode::BAD_REQUEST, "invalid org id"))
        );
    }
}
