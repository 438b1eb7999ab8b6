//! The per-process admin session.

use crate::api::{ApiClient, ApiClientConfig, ApiClientError, Credential, RateLimiter};
use crate::poll::Clock;
use crate::secrets::SecretProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Holds the single active [`ApiClient`] and where its credential comes from.
///
/// The client is created on the first call that needs it, from the secret
/// provider, or explicitly by [`AdminSession::initialize`]. A client's
/// credential never changes; initializing again replaces the whole client.
/// Every client the session creates draws from the same rate limiter.
pub struct AdminSession {
    config: ApiClientConfig,
    secrets: Arc<dyn SecretProvider>,
    rate_limiter: Arc<RateLimiter>,
    client: Option<ApiClient>,
}

impl AdminSession {
    pub fn new(
        config: ApiClientConfig,
        secrets: Arc<dyn SecretProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::with_clock(
            config.max_calls,
            config.window,
            clock,
        ));
        Self {
            config,
            secrets,
            rate_limiter,
            client: None,
        }
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&ApiClient> {
        self.client.as_ref()
    }

    /// Token from the secret provider, if any.
    pub async fn stored_token(&self) -> Option<Credential> {
        self.secrets.get_token().await.and_then(Credential::new)
    }

    /// Replace the active client with one using `credential`.
    pub fn initialize(&mut self, credential: Credential) -> Result<&ApiClient, ApiClientError> {
        let client =
            ApiClient::with_rate_limiter(credential, &self.config, self.rate_limiter.clone())?;
        info!("API client initialized for {}", client.base_url());
        let client: &ApiClient = self.client.insert(client);
        Ok(client)
    }

    /// The active client, creating it from the secret provider if needed.
    /// `None` when no token is available.
    pub async fn ensure_client(&mut self) -> Option<&ApiClient> {
        if self.client.is_none() {
            let credential = self.stored_token().await?;
            if let Err(e) = self.initialize(credential) {
                warn!("Could not create API client: {}", e);
                return None;
            }
        }
        self.client.as_ref()
    }
}
