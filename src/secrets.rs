//! Bearer token lookup.
//!
//! Tokens come from the process environment first and the platform secret
//! store second. Nothing here prompts; a missing token is reported as `None`
//! and the caller decides what to tell the user.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors from a secret store lookup.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret store is not available on this platform")]
    Unsupported,

    #[error("failed to run secret store command: {0}")]
    Io(#[from] std::io::Error),

    #[error("secret store command exited with {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("secret is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// A source of the admin API bearer token.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// The token, or `None` when this source has none.
    async fn get_token(&self) -> Option<String>;

    /// Source name for log messages.
    fn name(&self) -> &'static str;
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// Reads the token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new(crate::env::credentials::TOKEN_ENV_VAR)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().and_then(non_blank)
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

/// Reads the token from the macOS login keychain via `security`.
#[derive(Debug, Clone)]
pub struct KeychainSecretProvider {
    service: String,
    account: String,
}

/// `security` exit status when no matching item exists.
const ITEM_NOT_FOUND_STATUS: i32 = 44;

impl KeychainSecretProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    /// Look up the generic password for the configured service and account.
    pub async fn lookup(&self) -> Result<Option<String>, SecretError> {
        if !cfg!(target_os = "macos") {
            return Err(SecretError::Unsupported);
        }

        let output = Command::new("security")
            .args([
                "find-generic-password",
                "-s",
                &self.service,
                "-a",
                &self.account,
                "-w",
            ])
            .output()
            .await?;

        match output.status.code() {
            Some(0) => Ok(non_blank(String::from_utf8(output.stdout)?)),
            Some(ITEM_NOT_FOUND_STATUS) => Ok(None),
            status => Err(SecretError::CommandFailed {
                status: status.unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

impl Default for KeychainSecretProvider {
    fn default() -> Self {
        Self::new(
            crate::env::credentials::KEYCHAIN_SERVICE,
            crate::env::credentials::KEYCHAIN_ACCOUNT,
        )
    }
}

#[async_trait]
impl SecretProvider for KeychainSecretProvider {
    async fn get_token(&self) -> Option<String> {
        match self.lookup().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not access keychain: {}", e);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "keychain"
    }
}

/// Tries each provider in order and returns the first token found.
#[derive(Default)]
pub struct ChainedSecretProvider {
    providers: Vec<Box<dyn SecretProvider>>,
}

impl ChainedSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Environment variable first, then the keychain.
    pub fn standard(env_var: &str, keychain_service: &str, keychain_account: &str) -> Self {
        Self::new()
            .with(EnvSecretProvider::new(env_var))
            .with(KeychainSecretProvider::new(keychain_service, keychain_account))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl SecretProvider for ChainedSecretProvider {
    async fn get_token(&self) -> Option<String> {
        for provider in &self.providers {
            if let Some(token) = provider.get_token().await {
                debug!("Bearer token found in {}", provider.name());
                return Some(token);
            }
        }
        debug!("No bearer token found");
        None
    }

    fn name(&self) -> &'static str {
        "chained"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TEST_VAR: &str = "LUCIDLINK_MCP_TEST_TOKEN";

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl SecretProvider for Fixed {
        async fn get_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_env_provider_reads_variable() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var(TEST_VAR, "  token-from-env \n") };
        let provider = EnvSecretProvider::new(TEST_VAR);
        assert_eq!(provider.get_token().await.as_deref(), Some("token-from-env"));
        unsafe { std::env::remove_var(TEST_VAR) };
    }

    #[tokio::test]
    #[serial]
    async fn test_env_provider_ignores_blank_and_missing() {
        unsafe { std::env::set_var(TEST_VAR, "   ") };
        let provider = EnvSecretProvider::new(TEST_VAR);
        assert!(provider.get_token().await.is_none());

        unsafe { std::env::remove_var(TEST_VAR) };
        assert!(provider.get_token().await.is_none());
    }

    #[tokio::test]
    async fn test_chain_returns_first_token() {
        let chain = ChainedSecretProvider::new()
            .with(Fixed(None))
            .with(Fixed(Some("second")))
            .with(Fixed(Some("third")));
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.get_token().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_empty_chain_has_no_token() {
        let chain = ChainedSecretProvider::new();
        assert!(chain.is_empty());
        assert!(chain.get_token().await.is_none());
    }

    #[cfg(not(target_os = "macos"))]
    #[tokio::test]
    async fn test_keychain_unsupported_off_macos() {
        let provider = KeychainSecretProvider::default();
        assert!(matches!(provider.lookup().await, Err(SecretError::Unsupported)));
        assert!(provider.get_token().await.is_none());
    }
}
