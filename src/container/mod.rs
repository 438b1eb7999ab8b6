//! Backend container lifecycle management.
//!
//! The admin API is served by a single named container. This module keeps the
//! container engine running, provisions the image and the container on demand
//! and exposes logs and stop for the tool surface.
//!
//! ## Architecture
//!
//! - [`engine`]: the [`ContainerEngine`] boundary consumed by the orchestrator
//! - [`client`]: [`DockerEngine`], the Docker Engine API binding via bollard
//! - [`config`]: builder for the backend container's creation settings
//! - [`orchestrator`]: the [`BackendOrchestrator`] state machine
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lucidlink_mcp::container::{BackendOrchestrator, DockerEngine, EngineSettings, OrchestratorSettings};
//! use lucidlink_mcp::poll::SystemClock;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Arc::new(DockerEngine::new(EngineSettings::default()));
//!     let orchestrator =
//!         BackendOrchestrator::new(engine, Arc::new(SystemClock), OrchestratorSettings::default());
//!
//!     match orchestrator.ensure_running().await {
//!         Ok(handle) => println!("API container {} is up", handle.short_id()),
//!         Err(failure) => eprintln!("{}", failure),
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod orchestrator;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{DockerEngine, EngineSettings};
pub use config::{BackendContainerConfig, BackendContainerConfigBuilder};
pub use engine::{ContainerEngine, ContainerInfo, RuntimeStatus};
pub use orchestrator::{
    BackendHandle, BackendOrchestrator, BackendStatus, ContainerState, OrchestrationFailure,
    OrchestratorSettings,
};

/// Container engine errors.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Docker Engine API error
    #[error("Container API error: {0}")]
    ApiError(#[from] bollard::errors::Error),

    /// Container not found
    #[error("Container not found: {0}")]
    NotFound(String),

    /// Container configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Image pull error reported inside the pull stream
    #[error("Pull failed: {0}")]
    PullError(String),

    /// Engine launch error
    #[error("Launch error: {0}")]
    LaunchError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// General error
    #[error("Container error: {0}")]
    Other(String),
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
