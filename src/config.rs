//! Server configuration.
//!
//! Every section has built-in defaults, so an empty or partial TOML file is a
//! valid configuration. See [`crate::cli::ConfigDiscovery`] for where files are
//! looked up.

use crate::api::ApiClientConfig;
use crate::container::{EngineSettings, OrchestratorSettings};
use crate::env;
use crate::secrets::ChainedSecretProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: env::api::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: env::api::REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub max_calls: usize,
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_calls: env::api::RATE_LIMIT_CALLS,
            window_secs: env::api::RATE_LIMIT_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSection {
    pub name: String,
    pub image: String,
    pub container_port: u16,
    pub host_port: u16,
    /// Engine application whose presence means the engine is installed.
    /// Falls back to the platform default when unset.
    pub engine_app_path: Option<PathBuf>,
    /// Command that launches the engine. Falls back to the platform default
    /// when unset; an empty list disables launching.
    pub launch_command: Option<Vec<String>>,
    pub engine_start_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub create_settle_secs: u64,
    pub start_settle_secs: u64,
    pub stop_timeout_secs: i64,
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            name: env::container::CONTAINER_NAME.to_string(),
            image: env::container::CONTAINER_IMAGE.to_string(),
            container_port: env::container::CONTAINER_PORT,
            host_port: env::container::HOST_PORT,
            engine_app_path: None,
            launch_command: None,
            engine_start_timeout_secs: env::container::ENGINE_START_TIMEOUT_SECS,
            poll_interval_ms: env::container::POLL_INTERVAL_MS,
            create_settle_secs: env::container::CREATE_SETTLE_SECS,
            start_settle_secs: env::container::START_SETTLE_SECS,
            stop_timeout_secs: env::container::STOP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    pub token_env_var: String,
    pub keychain_service: String,
    pub keychain_account: String,
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            token_env_var: env::credentials::TOKEN_ENV_VAR.to_string(),
            keychain_service: env::credentials::KEYCHAIN_SERVICE.to_string(),
            keychain_account: env::credentials::KEYCHAIN_ACCOUNT.to_string(),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api: ApiSection,
    pub rate_limit: RateLimitSection,
    pub container: ContainerSection,
    pub credentials: CredentialsSection,
}

impl ServerConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(env::api::BASE_URL_ENV_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            info!("API base URL overridden by {}", env::api::BASE_URL_ENV_VAR);
            self.api.base_url = base_url;
        }
    }

    /// Reject values that would make the server unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {}", e)))?;

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_secs must be greater than zero".to_string(),
            ));
        }
        if self.container.name.trim().is_empty() || self.container.image.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "container.name and container.image must not be empty".to_string(),
            ));
        }
        if self.container.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "container.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.api.base_url.clone(),
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
            max_calls: self.rate_limit.max_calls,
            window: Duration::from_secs(self.rate_limit.window_secs),
        }
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        let c = &self.container;
        OrchestratorSettings {
            container_name: c.name.clone(),
            image: c.image.clone(),
            container_port: c.container_port,
            host_port: c.host_port,
            engine_start_timeout: Duration::from_secs(c.engine_start_timeout_secs),
            poll_interval: Duration::from_millis(c.poll_interval_ms),
            create_settle: Duration::from_secs(c.create_settle_secs),
            start_settle: Duration::from_secs(c.start_settle_secs),
            stop_timeout_secs: c.stop_timeout_secs,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let platform = EngineSettings::default();
        EngineSettings {
            app_path: self
                .container
                .engine_app_path
                .clone()
                .or(platform.app_path),
            launch_command: self
                .container
                .launch_command
                .clone()
                .unwrap_or(platform.launch_command),
        }
    }

    /// Environment variable, then keychain.
    pub fn secret_provider(&self) -> ChainedSecretProvider {
        ChainedSecretProvider::standard(
            &self.credentials.token_env_var,
            &self.credentials.keychain_service,
            &self.credentials.keychain_account,
        )
    }
}
