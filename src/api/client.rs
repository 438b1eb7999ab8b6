//! Authenticated, rate-limited client for the LucidLink Admin API.

use crate::api::classifier::{self, TransportFailure};
use crate::api::rate_limiter::RateLimiter;
use crate::api::types::{
    AddMemberRequest, ApiClientConfig, ApiClientError, ApiResult, CreateFilespaceRequest,
    CreateGroupRequest, Credential, GrantPermissionRequest, GroupMembership,
    GroupMembershipRequest,
};
use crate::error::{ClassifiedError, ErrorKind};
use crate::poll::{Clock, SystemClock};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Client for the admin API served by the local container.
///
/// Every request is checked against the rate limiter first; a refused call
/// never reaches the network. Failures come back as [`ApiResult::Failure`]
/// with a classified cause, never as an `Err`.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credential: Credential,
    rate_limiter: Arc<RateLimiter>,
}

impl ApiClient {
    /// Create a client with the wall clock.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be parsed or the HTTP client fails to build.
    pub fn new(credential: Credential, config: &ApiClientConfig) -> Result<Self, ApiClientError> {
        Self::with_clock(credential, config, Arc::new(SystemClock))
    }

    /// Create a client whose rate limiter reads the given clock.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be parsed or the HTTP client fails to build.
    pub fn with_clock(
        credential: Credential,
        config: &ApiClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiClientError> {
        let rate_limiter = Arc::new(RateLimiter::with_clock(config.max_calls, config.window, clock));
        Self::with_rate_limiter(credential, config, rate_limiter)
    }

    /// Create a client that draws from an existing call budget.
    ///
    /// Clients sharing a limiter share one window, so replacing a client does
    /// not reset the budget.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be parsed or the HTTP client fails to build.
    pub fn with_rate_limiter(
        credential: Credential,
        config: &ApiClientConfig,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, ApiClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ApiClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            credential,
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Issue a request against `path`, relative to the base URL.
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.request_segments(method, &segments, body).await
    }

    /// Issue a request whose path segments are percent-encoded individually.
    async fn request_segments(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> ApiResult {
        if !self.rate_limiter.check_limit() {
            let wait = self.rate_limiter.time_until_reset();
            warn!("Rate limit reached, refusing {} /{}", method, segments.join("/"));
            return ApiResult::failure(None, classifier::rate_limited(wait));
        }

        let url = match self.endpoint_url(segments) {
            Ok(url) => url,
            Err(error) => return ApiResult::failure(None, error),
        };

        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(self.credential.expose())
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = classifier::classify_transport(TransportFailure::from(&e));
                warn!("{} request failed before a response: {}", method, error);
                return ApiResult::failure(None, error);
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let error = classifier::classify_transport(TransportFailure::from(&e));
                return ApiResult::failure(Some(status), error);
            }
        };

        if matches!(status, 200 | 201 | 204) {
            let body = if text.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&text).unwrap_or_else(|_| json!({}))
            };
            return ApiResult::Success {
                status_code: status,
                body,
            };
        }

        let error = classifier::classify_status(status, &text);
        warn!("{} returned {}: {}", method, status, error.message);
        ApiResult::failure(Some(status), error)
    }

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, ClassifiedError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClassifiedError::new(ErrorKind::Unknown, "API base URL cannot take a path")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: Serialize>(&self, method: Method, segments: &[&str], body: &T) -> ApiResult {
        match serde_json::to_value(body) {
            Ok(value) => self.request_segments(method, segments, Some(&value)).await,
            Err(e) => ApiResult::failure(
                None,
                ClassifiedError::new(ErrorKind::Unknown, format!("Unexpected error: {}", e)),
            ),
        }
    }

    // Filespaces

    pub async fn create_filespace(&self, request: &CreateFilespaceRequest) -> ApiResult {
        self.send_json(Method::POST, &["filespaces"], request).await
    }

    pub async fn list_filespaces(&self) -> ApiResult {
        self.request_segments(Method::GET, &["filespaces"], None).await
    }

    pub async fn get_filespace(&self, filespace_id: &str) -> ApiResult {
        self.request_segments(Method::GET, &["filespaces", filespace_id], None)
            .await
    }

    pub async fn delete_filespace(&self, filespace_id: &str) -> ApiResult {
        self.request_segments(Method::DELETE, &["filespaces", filespace_id], None)
            .await
    }

    // Members

    pub async fn add_member(&self, email: &str) -> ApiResult {
        let body = AddMemberRequest {
            email: email.to_string(),
        };
        self.send_json(Method::POST, &["members"], &body).await
    }

    pub async fn list_members(&self) -> ApiResult {
        self.request_segments(Method::GET, &["members"], None).await
    }

    pub async fn get_member(&self, member_id: &str) -> ApiResult {
        self.request_segments(Method::GET, &["members", member_id], None)
            .await
    }

    pub async fn remove_member(&self, member_id: &str) -> ApiResult {
        self.request_segments(Method::DELETE, &["members", member_id], None)
            .await
    }

    // Groups

    pub async fn create_group(&self, name: &str, description: &str) -> ApiResult {
        let body = CreateGroupRequest {
            name: name.to_string(),
            description: description.to_string(),
        };
        self.send_json(Method::POST, &["groups"], &body).await
    }

    pub async fn list_groups(&self) -> ApiResult {
        self.request_segments(Method::GET, &["groups"], None).await
    }

    pub async fn add_member_to_group(&self, group_id: &str, member_id: &str) -> ApiResult {
        let body = GroupMembershipRequest {
            memberships: vec![GroupMembership {
                group_id: group_id.to_string(),
                member_id: member_id.to_string(),
            }],
        };
        self.send_json(Method::PUT, &["groups", "members"], &body)
            .await
    }

    pub async fn remove_member_from_group(&self, group_id: &str, member_id: &str) -> ApiResult {
        self.request_segments(
            Method::DELETE,
            &["groups", group_id, "members", member_id],
            None,
        )
        .await
    }

    // Permissions

    pub async fn grant_permission(
        &self,
        filespace_id: &str,
        request: &GrantPermissionRequest,
    ) -> ApiResult {
        self.send_json(
            Method::POST,
            &["filespaces", filespace_id, "permissions"],
            request,
        )
        .await
    }

    pub async fn list_permissions(&self, filespace_id: &str) -> ApiResult {
        self.request_segments(Method::GET, &["filespaces", filespace_id, "permissions"], None)
            .await
    }

    pub async fn revoke_permission(&self, filespace_id: &str, permission_id: &str) -> ApiResult {
        self.request_segments(
            Method::DELETE,
            &["filespaces", filespace_id, "permissions", permission_id],
            None,
        )
        .await
    }

    // Service

    pub async fn health(&self) -> ApiResult {
        self.request_segments(Method::GET, &["health"], None).await
    }

    pub async fn list_providers(&self) -> ApiResult {
        self.request_segments(Method::GET, &["providers"], None).await
    }
}
