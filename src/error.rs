//! Failure taxonomy shared by validation, the API client and orchestration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Closed set of causes a tool operation can fail with.
///
/// The kind is decided where the failure is observed (HTTP status, transport
/// error, engine response) and travels with the human-readable text, so
/// rendering never has to guess the cause from a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationRejected,
    RateLimited,
    InvalidRequest,
    AuthFailed,
    PermissionDenied,
    NotFound,
    Conflict,
    Unprocessable,
    ServerError,
    Unreachable,
    TimedOut,
    EngineUnavailable,
    ImagePullFailed,
    ContainerStartFailed,
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status code to its kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidRequest,
            401 => ErrorKind::AuthFailed,
            403 => ErrorKind::PermissionDenied,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            422 => ErrorKind::Unprocessable,
            429 => ErrorKind::RateLimited,
            500 => ErrorKind::ServerError,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationRejected => "ValidationRejected",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::AuthFailed => "AuthFailed",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::Unreachable => "Unreachable",
            ErrorKind::TimedOut => "TimedOut",
            ErrorKind::EngineUnavailable => "EngineUnavailable",
            ErrorKind::ImagePullFailed => "ImagePullFailed",
            ErrorKind::ContainerStartFailed => "ContainerStartFailed",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure with its cause decided and its text attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// How long until a retry can succeed, when the cause is a rate limit.
    pub retry_after: Option<Duration>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, wait: Duration) -> Self {
        self.retry_after = Some(wait);
        self
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationRejected, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::from_status(400), ErrorKind::InvalidRequest);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::AuthFailed);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::PermissionDenied);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Unprocessable);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::ServerError);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Unknown);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Unknown);
    }

    #[test]
    fn test_display_uses_variant_name() {
        assert_eq!(ErrorKind::Conflict.to_string(), "Conflict");
        assert_eq!(ErrorKind::ImagePullFailed.to_string(), "ImagePullFailed");
    }

    #[test]
    fn test_classified_error_display() {
        let err = ClassifiedError::new(ErrorKind::Conflict, "exists");
        assert_eq!(err.to_string(), "Conflict: exists");
        assert!(err.retry_after.is_none());

        let limited = ClassifiedError::new(ErrorKind::RateLimited, "slow down")
            .with_retry_after(Duration::from_secs(12));
        assert_eq!(limited.retry_after, Some(Duration::from_secs(12)));
    }
}
