//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Explicit path given with `--config`
//! 2. Current directory: ./lucidlink-mcp.toml or ./.lucidlink-mcp/config.toml
//! 3. User config: ~/.lucidlink-mcp/config.toml
//! 4. Built-in defaults
//!
//! `LUCIDLINK_API_BASE_URL` is applied on top of whichever source wins.

use crate::config::{ConfigError, ServerConfig};
use crate::env;
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A loaded configuration and the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ServerConfig,
    /// `None` when built-in defaults are in use
    pub source: Option<PathBuf>,
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load the explicit file if given, otherwise discover one.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let mut loaded = match explicit {
            Some(path) => {
                info!("Loading configuration override from: {:?}", path);
                LoadedConfig {
                    config: ServerConfig::from_toml_file(path)?,
                    source: Some(path.to_path_buf()),
                }
            }
            None => Self::discover_config()?,
        };

        loaded.config.apply_env_overrides();
        loaded.config.validate()?;
        Ok(loaded)
    }

    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<LoadedConfig, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return Ok(LoadedConfig {
                config: ServerConfig::from_toml_file(&config_path)?,
                source: Some(config_path),
            });
        }

        info!("No configuration file found, using defaults");
        Ok(LoadedConfig {
            config: ServerConfig::default(),
            source: None,
        })
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::first_existing(Self::get_config_candidates())
    }

    fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let current_dir = std_env::current_dir().ok();
        let home_dir = Self::get_home_dir();
        Self::candidates_for(current_dir.as_deref(), home_dir.as_deref())
    }

    fn candidates_for(current_dir: Option<&Path>, home_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(current_dir) = current_dir {
            candidates.push(env::local_flat_config_file_path(current_dir));
            candidates.push(env::local_config_file_path(current_dir));
        }

        if let Some(home_dir) = home_dir {
            candidates.push(env::user_config_file_path(home_dir));
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Create a default config file in the user's home directory
    pub fn create_default_user_config() -> Result<PathBuf, ConfigError> {
        let home_dir = Self::get_home_dir().ok_or_else(|| {
            ConfigError::Invalid("Could not determine home directory".to_string())
        })?;

        let config_dir = env::user_app_dir_path(&home_dir);
        let config_path = env::user_config_file_path(&home_dir);

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|source| ConfigError::Io {
                path: config_dir.clone(),
                source,
            })?;
            info!("Created configuration directory: {:?}", config_dir);
        }

        if !config_path.exists() {
            ServerConfig::default().to_toml_file(&config_path)?;
            info!("Created default configuration file: {:?}", config_path);
        } else {
            warn!("Configuration file already exists: {:?}", config_path);
        }

        Ok(config_path)
    }

    /// Show configuration discovery information and the effective settings
    pub fn show_discovery_info(explicit: Option<&Path>) {
        println!("Configuration Discovery Hierarchy:");
        println!();

        let mut candidates = Self::get_config_candidates();
        if let Some(path) = explicit {
            candidates.insert(0, path.to_path_buf());
        }

        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::load(explicit) {
            Ok(loaded) => {
                match &loaded.source {
                    Some(path) => println!("Active configuration: {:?}", path),
                    None => println!("Active configuration: Built-in defaults"),
                }
                println!();
                match loaded.config.to_toml_string() {
                    Ok(toml) => println!("{}", toml),
                    Err(e) => println!("Could not render configuration: {}", e),
                }
            }
            Err(e) => println!("Configuration error: {}", e),
        }
    }
}
