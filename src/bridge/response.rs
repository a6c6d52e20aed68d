//! Response translation: backend result → outbound HTTP response.
//!
//! # Responsibilities
//! - Write successful backend responses verbatim
//! - Unpack responses carried in the failure channel (application 4xx/5xx)
//! - Degrade transport failures to a plain-text 500
//!
//! # Design Decisions
//! - Total: every result maps to exactly one response
//! - A backend response HTTP cannot express (bad status, bad header) is
//!   logged and reported like a transport failure

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::backend::proto::HttpResponse;
use crate::backend::{BackendFailure, BackendResult};
use crate::error::BridgeError;

/// Turn a backend result into the response sent to the caller.
pub fn to_outbound(result: BackendResult) -> Response {
    match result {
        BackendResult::Success(response) => write_or_fail(response),
        BackendResult::Failure(BackendFailure {
            message,
            response: Some(response),
        }) => {
            tracing::debug!(status = response.code, message = %message, "Backend returned error response");
            write_or_fail(response)
        }
        BackendResult::Failure(BackendFailure {
            message,
            response: None,
        }) => {
            tracing::warn!(error = %message, "Backend call failed");
            error_response(&message)
        }
    }
}

/// Convert an unpacked backend response into an HTTP response.
///
/// Each header entry replaces any earlier values for the same key.
pub fn write_response(response: HttpResponse) -> Result<Response, BridgeError> {
    let mut headers = HeaderMap::new();
    for header in response.headers {
        let name = HeaderName::from_bytes(header.key.as_bytes()).map_err(|_| BridgeError::InvalidHeader {
            key: header.key.clone(),
        })?;
        headers.remove(&name);
        for value in &header.values {
            let value = HeaderValue::from_str(value).map_err(|_| BridgeError::InvalidHeader {
                key: header.key.clone(),
            })?;
            headers.append(name.clone(), value);
        }
    }

    let status = u16::try_from(response.code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or(BridgeError::InvalidStatus(response.code))?;

    let mut out = Response::new(Body::from(response.body));
    *out.headers_mut() = headers;
    *out.status_mut() = status;
    Ok(out)
}

/// Plain-text 500 carrying `message` as the body.
pub fn error_response(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()).into_response()
}

fn write_or_fail(response: HttpResponse) -> Response {
    match write_response(response) {
        Ok(out) => out,
        Err(e) => {
            tracing::error!(error = %e, "Failed to write backend response");
            error_response(&e.to_string())
        }
    }
}
