//! Docker Engine binding for [`ContainerEngine`].
//!
//! Wraps the bollard Docker API with lazy connection handling, a Podman socket
//! fallback and the platform-specific way of launching Docker Desktop.

use crate::container::{
    BackendContainerConfig, ContainerEngine, ContainerError, ContainerInfo, Result, RuntimeStatus,
};
use async_trait::async_trait;
use bollard::Docker;
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// How to find and launch the engine application.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Application bundle whose presence means the engine is installed.
    /// When unset, a `docker` executable on `PATH` counts as installed.
    pub app_path: Option<PathBuf>,
    /// Command that starts the engine application. Empty means the engine
    /// must be started outside this process.
    pub launch_command: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self {
                app_path: Some(PathBuf::from(crate::env::container::DOCKER_DESKTOP_APP_PATH)),
                launch_command: vec!["open".to_string(), "-a".to_string(), "Docker".to_string()],
            }
        } else {
            Self {
                app_path: None,
                launch_command: Vec::new(),
            }
        }
    }
}

/// Docker Engine API client.
///
/// The underlying connection is created on first use and kept for the life
/// of the process.
pub struct DockerEngine {
    docker: OnceCell<Docker>,
    settings: EngineSettings,
    ping_timeout: Duration,
}

impl DockerEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            docker: OnceCell::new(),
            settings,
            ping_timeout: Duration::from_secs(crate::env::container::PING_TIMEOUT_SECS),
        }
    }

    /// Use an existing connection instead of discovering one.
    pub fn with_connection(docker: Docker, settings: EngineSettings) -> Self {
        Self {
            docker: OnceCell::from(docker),
            ..Self::new(settings)
        }
    }

    /// Bound each ping; a socket that accepts but never answers counts as down.
    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    async fn docker(&self) -> Result<&Docker> {
        self.docker.get_or_try_init(|| async { Self::connect() }).await
    }

    /// Connect to Docker or Podman.
    ///
    /// Tries, in order:
    /// 1. Local defaults (`DOCKER_HOST`, Unix socket or Windows named pipe)
    /// 2. Rootless Podman socket
    /// 3. System Podman socket
    fn connect() -> Result<Docker> {
        debug!("Attempting to connect to container runtime...");

        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container runtime via local defaults");
                return Ok(docker);
            }
            Err(e) => {
                debug!("Local defaults failed: {}", e);
            }
        }

        #[cfg(unix)]
        {
            if let Ok(home) = std::env::var("HOME") {
                let podman_socket = format!("unix://{}/run/podman/podman.sock", home);
                debug!("Trying Podman socket: {}", podman_socket);

                match Docker::connect_with_socket(&podman_socket, 120, bollard::API_DEFAULT_VERSION)
                {
                    Ok(docker) => {
                        info!("Connected to Podman via rootless socket");
                        return Ok(docker);
                    }
                    Err(e) => {
                        debug!("Podman rootless socket failed: {}", e);
                    }
                }
            }

            let system_socket = "unix:///run/podman/podman.sock";
            debug!("Trying system Podman socket: {}", system_socket);

            match Docker::connect_with_socket(system_socket, 120, bollard::API_DEFAULT_VERSION) {
                Ok(docker) => {
                    info!("Connected to Podman via system socket");
                    return Ok(docker);
                }
                Err(e) => {
                    debug!("Podman system socket failed: {}", e);
                }
            }
        }

        Err(ContainerError::Other(
            "Failed to connect to Docker or Podman. Please ensure Docker is installed and running."
                .to_string(),
        ))
    }
}

fn is_not_found(e: &bollard::errors::Error) -> bool {
    matches!(
        e,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    fn is_installed(&self) -> bool {
        match &self.settings.app_path {
            Some(path) => path.exists(),
            None => which::which("docker").is_ok(),
        }
    }

    async fn ping(&self) -> bool {
        let docker = match self.docker().await {
            Ok(docker) => docker,
            Err(e) => {
                debug!("Docker not running: {}", e);
                return false;
            }
        };

        match tokio::time::timeout(self.ping_timeout, docker.ping()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Docker not running: {}", e);
                false
            }
            Err(_) => {
                debug!("Docker ping timed out after {:?}", self.ping_timeout);
                false
            }
        }
    }

    async fn launch(&self) -> Result<()> {
        let (program, args) = self.settings.launch_command.split_first().ok_or_else(|| {
            ContainerError::LaunchError(
                "No launch command configured; start the container engine manually".to_string(),
            )
        })?;

        info!("Starting container engine: {} {:?}", program, args);

        let output = Command::new(program).args(args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ContainerError::LaunchError(format!(
                "'{}' exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>> {
        let docker = self.docker().await?;

        let inspect = match docker
            .inspect_container(
                name,
                None::<bollard::query_parameters::InspectContainerOptions>,
            )
            .await
        {
            Ok(inspect) => inspect,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(ContainerError::ApiError(e)),
        };

        let id = inspect
            .id
            .ok_or_else(|| ContainerError::Other(format!("Container {} has no ID", name)))?;

        let state = inspect
            .state
            .ok_or_else(|| ContainerError::Other(format!("Container {} has no state", name)))?;

        let status = if state.running.unwrap_or(false) {
            RuntimeStatus::Running
        } else if state.paused.unwrap_or(false) {
            RuntimeStatus::Paused
        } else if state.restarting.unwrap_or(false) {
            RuntimeStatus::Restarting
        } else if state.dead.unwrap_or(false) {
            RuntimeStatus::Dead
        } else if state.started_at.as_deref().is_none_or(|s| s.starts_with("0001-")) {
            RuntimeStatus::Created
        } else {
            RuntimeStatus::Stopped
        };

        Ok(Some(ContainerInfo {
            id,
            name: name.to_string(),
            status,
        }))
    }

    async fn image_exists(&self, image: &str) -> Result<bool> {
        let docker = self.docker().await?;

        match docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(ContainerError::ApiError(e)),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        let docker = self.docker().await?;
        info!("Pulling image {} from registry...", image);

        let mut stream = docker.create_image(
            Some(bollard::image::CreateImageOptions {
                from_image: image,
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        debug!("Pull: {}", status);
                    }
                    if let Some(progress) = info.progress {
                        debug!("Pull progress: {}", progress);
                    }
                    if let Some(error) = info.error {
                        return Err(ContainerError::PullError(error));
                    }
                }
                Err(e) => {
                    return Err(ContainerError::ApiError(e));
                }
            }
        }

        info!("Successfully pulled image: {}", image);
        Ok(())
    }

    async fn create_container(&self, config: &BackendContainerConfig) -> Result<String> {
        let docker = self.docker().await?;

        let options = bollard::container::CreateContainerOptions {
            name: config.name.as_str(),
            ..Default::default()
        };

        let exposed_ports: HashMap<String, HashMap<(), ()>> = config
            .exposed_ports
            .iter()
            .map(|port| (port.clone(), HashMap::new()))
            .collect();

        use bollard::container::Config as BollardConfig;

        let bollard_config = BollardConfig {
            image: Some(config.image.clone()),
            labels: config.labels.clone(),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(config.host_config.clone()),
            ..Default::default()
        };

        debug!("Creating container: {}", config.name);

        let response = docker
            .create_container(Some(options), bollard_config)
            .await?;

        for warning in &response.warnings {
            warn!("Create {}: {}", config.name, warning);
        }

        info!("Created container: {} ({})", config.name, response.id);
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        let docker = self.docker().await?;
        debug!("Starting container: {}", id);

        docker
            .start_container(id, None::<bollard::container::StartContainerOptions<String>>)
            .await?;

        info!("Started container: {}", id);
        Ok(())
    }

    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()> {
        let docker = self.docker().await?;
        debug!("Stopping container: {}", id);

        docker
            .stop_container(
                id,
                Some(bollard::container::StopContainerOptions { t: timeout_secs }),
            )
            .await?;

        info!("Stopped container: {}", id);
        Ok(())
    }

    async fn logs(&self, id: &str, tail: usize) -> Result<String> {
        let docker = self.docker().await?;

        let mut stream = docker.logs(
            id,
            Some(bollard::container::LogsOptions {
                stdout: true,
                stderr: true,
                tail: tail.to_string(),
                ..Default::default()
            }),
        );
        let mut output = String::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(log) => {
                    output.push_str(&log.to_string());
                }
                Err(e) => {
                    return Err(ContainerError::ApiError(e));
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_tag::tag;

    #[test]
    fn test_missing_app_path_is_not_installed() {
        let engine = DockerEngine::new(EngineSettings {
            app_path: Some(PathBuf::from("/definitely/not/here/Docker.app")),
            launch_command: Vec::new(),
        });
        assert!(!engine.is_installed());
    }

    #[test]
    fn test_existing_app_path_is_installed() {
        let dir = tempfile::tempdir().unwrap();
        let engine = DockerEngine::new(EngineSettings {
            app_path: Some(dir.path().to_path_buf()),
            launch_command: Vec::new(),
        });
        assert!(engine.is_installed());
    }

    #[tokio::test]
    async fn test_launch_without_command_fails() {
        let engine = DockerEngine::new(EngineSettings {
            app_path: None,
            launch_command: Vec::new(),
        });
        let result = engine.launch().await;
        assert!(matches!(result, Err(ContainerError::LaunchError(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ping_against_silent_socket_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("docker.sock");
        let listener = tokio::net::UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let docker = Docker::connect_with_socket(
            socket.to_str().unwrap(),
            120,
            bollard::API_DEFAULT_VERSION,
        )
        .unwrap();
        let engine = DockerEngine::with_connection(
            docker,
            EngineSettings {
                app_path: None,
                launch_command: Vec::new(),
            },
        )
        .with_ping_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        assert!(!engine.ping().await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_reports_failing_command() {
        let engine = DockerEngine::new(EngineSettings {
            app_path: None,
            launch_command: vec!["false".to_string()],
        });
        let result = engine.launch().await;
        assert!(matches!(result, Err(ContainerError::LaunchError(_))));
    }

    #[tokio::test]
    #[tag(docker)]
    #[ignore] // Requires Docker to be running
    async fn test_ping_live_engine() {
        let engine = DockerEngine::new(EngineSettings::default());
        assert!(engine.ping().await);
    }

    #[tokio::test]
    #[tag(docker)]
    #[ignore]
    async fn test_inspect_missing_container() {
        let engine = DockerEngine::new(EngineSettings::default());
        let info = engine
            .inspect_container("lucidlink-mcp-test-does-not-exist")
            .await
            .unwrap();
        assert!(info.is_none());
    }
}
