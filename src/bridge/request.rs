//! Request translation: inbound HTTP request → `HttpRequest` wire message.
//!
//! # Responsibilities
//! - Copy method and URL path (query string is not forwarded)
//! - Read the whole body, bounded by the configured limit
//! - Group header values per key, keeping their order
//! - Send keys in canonical MIME form (`X-Scope-Orgid`), the form `httpgrpc`
//!   servers look them up by

use axum::{
    body::Body,
    http::{HeaderMap, Request},
};

use crate::backend::proto::{Header, HttpRequest};
use crate::error::BridgeError;

/// Build the backend payload for `request`, draining its body.
///
/// Fails with [`BridgeError::Body`] if the body errors, is truncated, or is
/// larger than `body_limit`.
pub async fn translate(request: Request<Body>, body_limit: usize) -> Result<HttpRequest, BridgeError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, body_limit)
        .await
        .map_err(BridgeError::Body)?;

    Ok(HttpRequest {
        method: parts.method.to_string(),
        url: parts.uri.path().to_string(),
        headers: from_header_map(&parts.headers),
        body,
    })
}

/// One [`Header`] per distinct key, values in the order they were received.
pub fn from_header_map(headers: &HeaderMap) -> Vec<Header> {
    headers
        .keys()
        .map(|key| Header {
            key: canonical_key(key.as_str()),
            values: headers
                .get_all(key)
                .iter()
                // wire type is string; non-UTF-8 bytes are replaced
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect(),
        })
        .collect()
}

/// `x-scope-orgid` → `X-Scope-Orgid`: first letter and every letter after a
/// hyphen upper case, the rest lower case.
pub fn canonical_key(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}
