//! Environment constants and path utilities for the LucidLink MCP server.
//!
//! This module centralizes all hardcoded names, ports and paths used throughout
//! the application, making them easier to maintain and modify.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory in the user's home)
pub const APP_DIR_NAME: &str = ".lucidlink-mcp";

/// Configuration file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "lucidlink-mcp.toml";

/// Admin API constants
pub mod api {
    /// Base URL of the API served by the local container
    pub const DEFAULT_BASE_URL: &str = "http://localhost:3003/api/v1";

    /// Environment variable overriding the configured base URL
    pub const BASE_URL_ENV_VAR: &str = "LUCIDLINK_API_BASE_URL";

    /// Per-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Calls allowed per rate-limit window
    pub const RATE_LIMIT_CALLS: usize = 10;

    /// Rate-limit window in seconds
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
}

/// Backend container constants
pub mod container {
    /// Name of the managed container
    pub const CONTAINER_NAME: &str = "lucidlink-api";

    /// Image the container is created from
    pub const CONTAINER_IMAGE: &str = "lucidlink/lucidlink-api:latest";

    /// Port the API listens on inside the container
    pub const CONTAINER_PORT: u16 = 3003;

    /// Host port the container port is published on
    pub const HOST_PORT: u16 = 3003;

    /// Seconds to wait for the engine after launching it
    pub const ENGINE_START_TIMEOUT_SECS: u64 = 60;

    /// Milliseconds between engine availability probes
    pub const POLL_INTERVAL_MS: u64 = 1000;

    /// Settle delay after creating the container
    pub const CREATE_SETTLE_SECS: u64 = 3;

    /// Settle delay after starting an existing container
    pub const START_SETTLE_SECS: u64 = 2;

    /// Grace period given to the container on stop
    pub const STOP_TIMEOUT_SECS: i64 = 10;

    /// Upper bound on a single engine ping
    pub const PING_TIMEOUT_SECS: u64 = 5;

    /// Where Docker Desktop lives on macOS
    pub const DOCKER_DESKTOP_APP_PATH: &str = "/Applications/Docker.app";
}

/// Credential lookup constants
pub mod credentials {
    /// Environment variable holding the bearer token
    pub const TOKEN_ENV_VAR: &str = "LUCIDLINK_BEARER_TOKEN";

    /// Keychain service name
    pub const KEYCHAIN_SERVICE: &str = "lucidlink-mcp";

    /// Keychain account name
    pub const KEYCHAIN_ACCOUNT: &str = "bearer_token";
}

/// Build the application directory path in the user's home directory
pub fn user_app_dir_path(home_dir: &Path) -> PathBuf {
    home_dir.join(APP_DIR_NAME)
}

/// Build the config file path in the user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build the hidden-directory config file path under the current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Build the flat config file path under the current directory
pub fn local_flat_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LOCAL_CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let home_dir = Path::new("/home/user");
        let current_dir = Path::new("/current/project");

        assert_eq!(
            user_config_file_path(home_dir),
            Path::new("/home/user/.lucidlink-mcp/config.toml")
        );

        assert_eq!(
            local_config_file_path(current_dir),
            Path::new("/current/project/.lucidlink-mcp/config.toml")
        );

        assert_eq!(
            local_flat_config_file_path(current_dir),
            Path::new("/current/project/lucidlink-mcp.toml")
        );
    }

    #[test]
    fn test_base_url_matches_published_port() {
        assert!(api::DEFAULT_BASE_URL.contains(&container::HOST_PORT.to_string()));
    }
}
