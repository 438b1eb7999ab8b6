//! Failure classification for admin API exchanges.
//!
//! Transport failures are turned into a [`TransportFailure`] where the
//! `reqwest` error is observed; HTTP failures are classified from the status
//! code and, when present, the structured error body.

use crate::error::{ClassifiedError, ErrorKind};
use serde_json::Value;
use std::time::Duration;

/// Transport-level failure, decided before any status code exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connection refused, DNS failure and similar.
    Connect(String),
    /// The request exceeded its deadline.
    Timeout,
    /// Anything else the HTTP stack reported.
    Other(String),
}

impl From<&reqwest::Error> for TransportFailure {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_connect() {
            TransportFailure::Connect(err.to_string())
        } else if err.is_timeout() {
            TransportFailure::Timeout
        } else {
            TransportFailure::Other(err.to_string())
        }
    }
}

/// Fixed message for the status codes the API documents.
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Invalid request parameters"),
        401 => Some("Authentication failed - check your Bearer token"),
        403 => Some("Permission denied"),
        404 => Some("Resource not found"),
        409 => Some("Resource already exists"),
        422 => Some("Request cannot be processed"),
        500 => Some("API server error"),
        _ => None,
    }
}

/// Text of the `message` (preferred) or `error` field of a JSON error body.
fn body_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let object = parsed.as_object()?;

    ["message", "error"].iter().find_map(|key| match object.get(*key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Classify a response whose status is not a success.
pub fn classify_status(status: u16, body: &str) -> ClassifiedError {
    let message = body_message(body)
        .or_else(|| status_message(status).map(str::to_string))
        .unwrap_or_else(|| format!("API error (status {})", status));

    ClassifiedError::new(ErrorKind::from_status(status), message)
}

/// Classify a failure that happened before a response arrived.
pub fn classify_transport(failure: TransportFailure) -> ClassifiedError {
    match failure {
        TransportFailure::Connect(_) => ClassifiedError::new(
            ErrorKind::Unreachable,
            "Cannot connect to API. Please ensure Docker container is running.",
        ),
        TransportFailure::Timeout => {
            ClassifiedError::new(ErrorKind::TimedOut, "API request timed out.")
        }
        TransportFailure::Other(detail) => {
            ClassifiedError::new(ErrorKind::Unknown, format!("Unexpected error: {}", detail))
        }
    }
}

/// Local refusal from the rate limiter.
pub fn rate_limited(wait: Duration) -> ClassifiedError {
    ClassifiedError::new(
        ErrorKind::RateLimited,
        format!("Rate limit exceeded. Please wait {} seconds.", whole_seconds(wait)),
    )
    .with_retry_after(wait)
}

/// Seconds to tell the user to wait, rounded up so a sub-second wait is never "0".
pub fn whole_seconds(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 { secs + 1 } else { secs }
}
