//! The container engine boundary.
//!
//! The orchestrator only talks to the engine through [`ContainerEngine`], so
//! tests can substitute a scripted engine for the Docker daemon.

use crate::container::{BackendContainerConfig, Result};
use async_trait::async_trait;
use std::fmt;

/// Operations the orchestrator needs from a container engine.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Whether the engine application is present on this machine.
    fn is_installed(&self) -> bool;

    /// Whether the engine daemon answers.
    async fn ping(&self) -> bool;

    /// Ask the platform to start the engine application. Returns once the
    /// launch command has been issued, not once the daemon is up.
    async fn launch(&self) -> Result<()>;

    /// Look up a container by name; `None` when it does not exist.
    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>>;

    async fn image_exists(&self, image: &str) -> Result<bool>;

    async fn pull_image(&self, image: &str) -> Result<()>;

    /// Create the container and return its ID.
    async fn create_container(&self, config: &BackendContainerConfig) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()>;

    /// The last `tail` lines of the container's combined output.
    async fn logs(&self, id: &str, tail: usize) -> Result<String>;

    /// Engine name for messages.
    fn engine_name(&self) -> &'static str {
        "Docker"
    }
}

/// What the engine reports about a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub status: RuntimeStatus,
}

/// Runtime status of an existing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    /// Created but never started
    Created,
    /// Container is running
    Running,
    /// Container is paused
    Paused,
    /// Container is restarting
    Restarting,
    /// Container is stopped
    Stopped,
    /// Container is dead
    Dead,
}

impl RuntimeStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, RuntimeStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeStatus::Created => "created",
            RuntimeStatus::Running => "running",
            RuntimeStatus::Paused => "paused",
            RuntimeStatus::Restarting => "restarting",
            RuntimeStatus::Stopped => "exited",
            RuntimeStatus::Dead => "dead",
        }
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
