//! Backend container orchestration.
//!
//! Drives the engine and the named API container towards a running state:
//! launches the engine when it is down, pulls the image when it is missing,
//! creates or restarts the container, and reports every step it took.

use crate::container::{BackendContainerConfig, ContainerEngine, ContainerError, RuntimeStatus};
use crate::env::container as defaults;
use crate::error::{ClassifiedError, ErrorKind};
use crate::poll::{Clock, wait_until};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const NOT_INSTALLED_MESSAGE: &str =
    "Docker Desktop is not installed. Please install from https://docker.com/products/docker-desktop";

const ENGINE_START_FAILED_MESSAGE: &str = "Docker Desktop is not running and failed to start";

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Name of the managed container
    pub container_name: String,
    /// Image the container is created from
    pub image: String,
    /// Port the API listens on inside the container
    pub container_port: u16,
    /// Host port the API is published on
    pub host_port: u16,
    /// How long to wait for the engine after launching it
    pub engine_start_timeout: Duration,
    /// Delay between engine availability probes
    pub poll_interval: Duration,
    /// Pause after creating a new container
    pub create_settle: Duration,
    /// Pause after restarting an existing container
    pub start_settle: Duration,
    /// Grace period given to the container on stop, in seconds
    pub stop_timeout_secs: i64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            container_name: defaults::CONTAINER_NAME.to_string(),
            image: defaults::CONTAINER_IMAGE.to_string(),
            container_port: defaults::CONTAINER_PORT,
            host_port: defaults::HOST_PORT,
            engine_start_timeout: Duration::from_secs(defaults::ENGINE_START_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            create_settle: Duration::from_secs(defaults::CREATE_SETTLE_SECS),
            start_settle: Duration::from_secs(defaults::START_SETTLE_SECS),
            stop_timeout_secs: defaults::STOP_TIMEOUT_SECS,
        }
    }
}

/// Where the backend is in its path to running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContainerState {
    NotInstalled,
    EngineStopped,
    EngineStarting,
    ImageMissing,
    ImagePulling,
    ContainerAbsent,
    ContainerStopped,
    ContainerStarting,
    Running,
    Error(String),
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::NotInstalled => f.write_str("not installed"),
            ContainerState::EngineStopped => f.write_str("engine stopped"),
            ContainerState::EngineStarting => f.write_str("engine starting"),
            ContainerState::ImageMissing => f.write_str("image missing"),
            ContainerState::ImagePulling => f.write_str("image pulling"),
            ContainerState::ContainerAbsent => f.write_str("container absent"),
            ContainerState::ContainerStopped => f.write_str("container stopped"),
            ContainerState::ContainerStarting => f.write_str("container starting"),
            ContainerState::Running => f.write_str("running"),
            ContainerState::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// A running backend container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendHandle {
    pub container_id: String,
    pub name: String,
    pub status: RuntimeStatus,
    /// States passed through while bringing the backend up, ending in `Running`.
    pub transitions: Vec<ContainerState>,
    /// Whether this call created the container.
    pub created: bool,
}

impl BackendHandle {
    /// First twelve characters of the container ID.
    pub fn short_id(&self) -> &str {
        let end = self
            .container_id
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.container_id.len());
        &self.container_id[..end]
    }
}

/// Why the backend could not be brought up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationFailure {
    /// State the orchestrator stopped in
    pub state: ContainerState,
    pub kind: ErrorKind,
    pub message: String,
    /// States passed through before the failure
    pub transitions: Vec<ContainerState>,
}

impl OrchestrationFailure {
    fn new(
        state: ContainerState,
        kind: ErrorKind,
        message: impl Into<String>,
        transitions: &[ContainerState],
    ) -> Self {
        Self {
            state,
            kind,
            message: message.into(),
            transitions: transitions.to_vec(),
        }
    }

    fn unexpected(error: ContainerError, transitions: &[ContainerState]) -> Self {
        let message = format!("Unexpected error: {}", error);
        Self::new(
            ContainerState::Error(message.clone()),
            ErrorKind::EngineUnavailable,
            message,
            transitions,
        )
    }
}

impl fmt::Display for OrchestrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for OrchestrationFailure {}

impl From<OrchestrationFailure> for ClassifiedError {
    fn from(failure: OrchestrationFailure) -> Self {
        ClassifiedError::new(failure.kind, failure.message)
    }
}

/// Engine and container status as reported by `check_docker_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub installed: bool,
    pub running: bool,
    pub container_status: String,
    pub message: String,
}

/// Owns the engine handle and brings the backend container up on demand.
///
/// Nothing is cached between calls except whether the engine is installed;
/// every call re-reads the engine and container state.
pub struct BackendOrchestrator {
    engine: Arc<dyn ContainerEngine>,
    clock: Arc<dyn Clock>,
    settings: OrchestratorSettings,
    installed: OnceLock<bool>,
}

impl BackendOrchestrator {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        clock: Arc<dyn Clock>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            engine,
            clock,
            settings,
            installed: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Whether the engine application is present. Checked once per process.
    pub fn is_installed(&self) -> bool {
        *self.installed.get_or_init(|| {
            let installed = self.engine.is_installed();
            if !installed {
                warn!("{} is not installed", self.engine.engine_name());
            }
            installed
        })
    }

    pub async fn is_engine_running(&self) -> bool {
        self.engine.ping().await
    }

    /// Make sure the engine daemon answers, launching it if needed.
    pub async fn ensure_engine_running(&self) -> Result<(), OrchestrationFailure> {
        let mut transitions = Vec::new();
        self.bring_up_engine(&mut transitions).await
    }

    async fn bring_up_engine(
        &self,
        transitions: &mut Vec<ContainerState>,
    ) -> Result<(), OrchestrationFailure> {
        if !self.is_installed() {
            transitions.push(ContainerState::NotInstalled);
            return Err(OrchestrationFailure::new(
                ContainerState::NotInstalled,
                ErrorKind::EngineUnavailable,
                NOT_INSTALLED_MESSAGE,
                transitions,
            ));
        }

        if self.engine.ping().await {
            return Ok(());
        }

        transitions.push(ContainerState::EngineStopped);
        info!("Starting {}...", self.engine.engine_name());

        if let Err(e) = self.engine.launch().await {
            error!("Failed to start {}: {}", self.engine.engine_name(), e);
            return Err(OrchestrationFailure::new(
                ContainerState::Error("engine failed to start".to_string()),
                ErrorKind::EngineUnavailable,
                ENGINE_START_FAILED_MESSAGE,
                transitions,
            ));
        }
        transitions.push(ContainerState::EngineStarting);

        let engine = &self.engine;
        let up = wait_until(
            self.clock.as_ref(),
            self.settings.poll_interval,
            self.settings.engine_start_timeout,
            || engine.ping(),
        )
        .await;

        if !up {
            error!(
                "{} failed to start within {:?}",
                self.engine.engine_name(),
                self.settings.engine_start_timeout
            );
            return Err(OrchestrationFailure::new(
                ContainerState::Error("engine failed to start".to_string()),
                ErrorKind::EngineUnavailable,
                ENGINE_START_FAILED_MESSAGE,
                transitions,
            ));
        }

        info!("{} started successfully", self.engine.engine_name());
        Ok(())
    }

    /// Bring the engine and the backend container to a running state.
    ///
    /// Safe to call before every operation: when everything is already up it
    /// costs one engine ping and one container lookup.
    pub async fn ensure_running(&self) -> Result<BackendHandle, OrchestrationFailure> {
        let mut transitions = Vec::new();
        self.bring_up_engine(&mut transitions).await?;

        let name = &self.settings.container_name;
        let existing = self
            .engine
            .inspect_container(name)
            .await
            .map_err(|e| OrchestrationFailure::unexpected(e, &transitions))?;

        let (container_id, created) = match existing {
            Some(info) if info.status.is_running() => {
                debug!("Container {} already running", name);
                (info.id, false)
            }
            Some(info) => {
                transitions.push(ContainerState::ContainerStopped);
                transitions.push(ContainerState::ContainerStarting);
                info!("Starting existing container {} ({})", name, info.status);

                self.engine.start_container(&info.id).await.map_err(|e| {
                    OrchestrationFailure::new(
                        ContainerState::Error("container failed to start".to_string()),
                        ErrorKind::ContainerStartFailed,
                        format!("Failed to start container: {}", e),
                        &transitions,
                    )
                })?;
                self.clock.sleep(self.settings.start_settle).await;
                (info.id, false)
            }
            None => {
                self.provision_image(&mut transitions).await?;
                let id = self.create_and_start(&mut transitions).await?;
                (id, true)
            }
        };

        transitions.push(ContainerState::Running);

        Ok(BackendHandle {
            container_id,
            name: name.clone(),
            status: RuntimeStatus::Running,
            transitions,
            created,
        })
    }

    async fn provision_image(
        &self,
        transitions: &mut Vec<ContainerState>,
    ) -> Result<(), OrchestrationFailure> {
        let image = &self.settings.image;
        let present = self
            .engine
            .image_exists(image)
            .await
            .map_err(|e| OrchestrationFailure::unexpected(e, transitions))?;

        if present {
            return Ok(());
        }

        transitions.push(ContainerState::ImageMissing);
        info!("Image {} not found locally, pulling from registry", image);
        transitions.push(ContainerState::ImagePulling);

        self.engine.pull_image(image).await.map_err(|e| {
            error!("Failed to pull image {}: {}", image, e);
            OrchestrationFailure::new(
                ContainerState::Error("image pull failed".to_string()),
                ErrorKind::ImagePullFailed,
                format!(
                    "Container image '{}' not found locally and failed to pull from Docker Hub. Error: {}",
                    image, e
                ),
                transitions,
            )
        })
    }

    async fn create_and_start(
        &self,
        transitions: &mut Vec<ContainerState>,
    ) -> Result<String, OrchestrationFailure> {
        transitions.push(ContainerState::ContainerAbsent);
        info!("Creating new container {}", self.settings.container_name);

        let create_failed = |e: ContainerError, transitions: &[ContainerState]| {
            error!("Failed to create container: {}", e);
            OrchestrationFailure::new(
                ContainerState::Error("container creation failed".to_string()),
                ErrorKind::ContainerStartFailed,
                format!("Failed to create container: {}", e),
                transitions,
            )
        };

        let config = self
            .container_config()
            .map_err(|e| create_failed(e, transitions))?;
        let id = self
            .engine
            .create_container(&config)
            .await
            .map_err(|e| create_failed(e, transitions))?;

        transitions.push(ContainerState::ContainerStarting);
        self.engine.start_container(&id).await.map_err(|e| {
            error!("Failed to start container: {}", e);
            OrchestrationFailure::new(
                ContainerState::Error("container failed to start".to_string()),
                ErrorKind::ContainerStartFailed,
                format!("Failed to start container: {}", e),
                transitions,
            )
        })?;

        self.clock.sleep(self.settings.create_settle).await;
        Ok(id)
    }

    fn container_config(&self) -> crate::container::Result<BackendContainerConfig> {
        BackendContainerConfig::builder()
            .name(&self.settings.container_name)
            .image(&self.settings.image)
            .publish_tcp(self.settings.container_port, self.settings.host_port)
            .restart_unless_stopped()
            .label("lucidlink-mcp.managed", "true")
            .build()
    }

    /// Whether the image is available locally. Starts the engine if needed.
    pub async fn image_present(&self) -> Result<bool, OrchestrationFailure> {
        let mut transitions = Vec::new();
        self.bring_up_engine(&mut transitions).await?;

        self.engine
            .image_exists(&self.settings.image)
            .await
            .map_err(|e| OrchestrationFailure::unexpected(e, &transitions))
    }

    /// Pull the image from the registry. Starts the engine if needed.
    pub async fn pull_image(&self) -> Result<String, OrchestrationFailure> {
        let mut transitions = Vec::new();
        self.bring_up_engine(&mut transitions).await?;

        let image = &self.settings.image;
        info!("Pulling image {} from registry...", image);
        transitions.push(ContainerState::ImagePulling);

        match self.engine.pull_image(image).await {
            Ok(()) => Ok(format!("Successfully pulled image: {}", image)),
            Err(e) => {
                error!("Failed to pull image: {}", e);
                Err(OrchestrationFailure::new(
                    ContainerState::Error("image pull failed".to_string()),
                    ErrorKind::ImagePullFailed,
                    format!("Failed to pull image from Docker Hub: {}", e),
                    &transitions,
                ))
            }
        }
    }

    /// The last `lines` lines of container output, or the error as text.
    pub async fn logs(&self, lines: usize) -> String {
        let name = &self.settings.container_name;
        let result = match self.engine.inspect_container(name).await {
            Ok(Some(info)) => self.engine.logs(&info.id, lines).await,
            Ok(None) => Err(ContainerError::NotFound(name.clone())),
            Err(e) => Err(e),
        };

        match result {
            Ok(logs) => logs,
            Err(e) => format!("Error getting logs: {}", e),
        }
    }

    /// Stop the container. Stopping a container that is not running succeeds.
    pub async fn stop(&self) -> bool {
        let name = &self.settings.container_name;
        let info = match self.engine.inspect_container(name).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                debug!("No container {} to stop", name);
                return false;
            }
            Err(e) => {
                warn!("Failed to look up container {}: {}", name, e);
                return false;
            }
        };

        if !info.status.is_running() {
            debug!("Container {} already {}", name, info.status);
            return true;
        }

        match self
            .engine
            .stop_container(&info.id, self.settings.stop_timeout_secs)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to stop container {}: {}", name, e);
                false
            }
        }
    }

    /// Engine and container status, starting whatever is down.
    pub async fn status(&self) -> BackendStatus {
        if !self.is_installed() {
            return BackendStatus {
                installed: false,
                running: false,
                container_status: "unknown".to_string(),
                message: NOT_INSTALLED_MESSAGE.to_string(),
            };
        }

        if !self.engine.ping().await {
            let started = self.ensure_engine_running().await.is_ok();
            return BackendStatus {
                installed: true,
                running: started,
                container_status: "unknown".to_string(),
                message: if started {
                    "Docker Desktop started successfully".to_string()
                } else {
                    "Failed to start Docker Desktop. Please start it manually.".to_string()
                },
            };
        }

        match self.ensure_running().await {
            Ok(handle) => BackendStatus {
                installed: true,
                running: true,
                container_status: handle.status.to_string(),
                message: "Docker and API container are ready".to_string(),
            },
            Err(failure) => BackendStatus {
                installed: true,
                running: true,
                container_status: "not_ready".to_string(),
                message: failure.message,
            },
        }
    }
}
