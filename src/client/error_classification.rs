//! Error classification logic

use crate::drivers::ProviderDriver;
use crate::transport::TransportError;
use crate::types::CompletionFailure;

/// Standard error class for an HTTP status, used in logs.
pub(crate) fn error_class(status: u16) -> &'static str {
    match status {
        400 | 422 => "invalid_request",
        401 => "authentication",
        403 => "permission_denied",
        404 => "not_found",
        408 => "timeout",
        409 => "conflict",
        413 => "request_too_large",
        429 => "rate_limited",
        500 => "server_error",
        502 | 503 | 529 => "overloaded",
        504 => "timeout",
        s if (500..=599).contains(&s) => "server_error",
        s if (400..=499).contains(&s) => "invalid_request",
        _ => "http_error",
    }
}

/// Build a `Protocol` failure from a non-200 response, surfacing the vendor message verbatim.
pub(crate) fn failure_from_status(
    driver: &dyn ProviderDriver,
    status: u16,
    body: &str,
) -> CompletionFailure {
    let vendor_message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| driver.parse_error_message(&v));

    let reason = match vendor_message {
        Some(msg) => msg,
        None => format!("request failed (HTTP {}, {})", status, error_class(status)),
    };
    CompletionFailure::protocol(status, reason)
}

/// A response that arrived but could not be read keeps its status.
pub(crate) fn failure_from_transport(err: &TransportError) -> CompletionFailure {
    match err {
        TransportError::Body { status: 200, .. } => CompletionFailure::contract(err.to_string()),
        TransportError::Body { status, .. } => CompletionFailure::protocol(*status, err.to_string()),
        _ => CompletionFailure::transport(err.to_string()),
    }
}
