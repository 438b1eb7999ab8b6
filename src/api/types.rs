use crate::error::ClassifiedError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Bearer token for the admin API.
///
/// The token is never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wrap a token, refusing blank strings.
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(Arc::from(token)))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars redacted>)", self.0.len())
    }
}

/// Outcome of one admin API request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    Success {
        status_code: u16,
        body: Value,
    },
    Failure {
        status_code: Option<u16>,
        error: ClassifiedError,
    },
}

impl ApiResult {
    pub fn failure(status_code: Option<u16>, error: ClassifiedError) -> Self {
        ApiResult::Failure { status_code, error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiResult::Success { status_code, .. } => Some(*status_code),
            ApiResult::Failure { status_code, .. } => *status_code,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiResult::Success { body, .. } => Some(body),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { error, .. } => Some(error),
        }
    }

    /// The `data` member of a success body, which the API wraps payloads in.
    pub fn data(&self) -> Option<&Value> {
        self.body().and_then(|body| body.get("data"))
    }
}

/// Settings for [`ApiClient`](crate::api::ApiClient).
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_calls: usize,
    pub window: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::env::api::DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(crate::env::api::REQUEST_TIMEOUT_SECS),
            max_calls: crate::env::api::RATE_LIMIT_CALLS,
            window: Duration::from_secs(crate::env::api::RATE_LIMIT_WINDOW_SECS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFilespaceRequest {
    pub name: String,
    pub region: String,
    pub storage_provider: String,
    pub storage_owner: String,
}

impl CreateFilespaceRequest {
    pub const DEFAULT_REGION: &'static str = "us-east-1";
    pub const DEFAULT_PROVIDER: &'static str = "AWS";
    pub const DEFAULT_OWNER: &'static str = "lucidlink";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: Self::DEFAULT_REGION.to_string(),
            storage_provider: Self::DEFAULT_PROVIDER.to_string(),
            storage_owner: Self::DEFAULT_OWNER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddMemberRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub group_id: String,
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMembershipRequest {
    pub memberships: Vec<GroupMembership>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrantPermissionRequest {
    pub path: String,
    pub permissions: Vec<String>,
    pub principal_id: String,
}

impl GrantPermissionRequest {
    pub const DEFAULT_PATH: &'static str = "/";

    pub fn read_only(principal_id: impl Into<String>) -> Self {
        Self {
            path: Self::DEFAULT_PATH.to_string(),
            permissions: vec!["read".to_string()],
            principal_id: principal_id.into(),
        }
    }
}
