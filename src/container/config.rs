//! Creation settings for the backend container.
//!
//! Provides a fluent API for describing the one container the server manages:
//! its name, image, published ports and restart policy.

use crate::container::{ContainerError, Result};
use bollard::service::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use std::collections::HashMap;

/// Builder for [`BackendContainerConfig`].
pub struct BackendContainerConfigBuilder {
    name: Option<String>,
    image: Option<String>,
    labels: HashMap<String, String>,
    port_bindings: HashMap<String, Option<Vec<PortBinding>>>,
    restart_policy: Option<RestartPolicyNameEnum>,
}

impl Default for BackendContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendContainerConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            image: None,
            labels: HashMap::new(),
            port_bindings: HashMap::new(),
            restart_policy: None,
        }
    }

    /// Set the container name.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the container image.
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Add a label to the container.
    pub fn label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Publish a TCP container port on a host port.
    pub fn publish_tcp(mut self, container_port: u16, host_port: u16) -> Self {
        self.port_bindings.insert(
            format!("{}/tcp", container_port),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(host_port.to_string()),
            }]),
        );
        self
    }

    /// Restart the container with the engine unless it was explicitly stopped.
    pub fn restart_unless_stopped(mut self) -> Self {
        self.restart_policy = Some(RestartPolicyNameEnum::UNLESS_STOPPED);
        self
    }

    /// Build the container configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the name or image is missing.
    pub fn build(self) -> Result<BackendContainerConfig> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ContainerError::ConfigError("Container name is required".to_string()))?;
        let image = self
            .image
            .filter(|i| !i.is_empty())
            .ok_or_else(|| ContainerError::ConfigError("Image is required".to_string()))?;

        let exposed_ports: Vec<String> = self.port_bindings.keys().cloned().collect();

        let host_config = HostConfig {
            port_bindings: if self.port_bindings.is_empty() {
                None
            } else {
                Some(self.port_bindings)
            },
            restart_policy: self.restart_policy.map(|name| RestartPolicy {
                name: Some(name),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        Ok(BackendContainerConfig {
            name,
            image,
            labels: if self.labels.is_empty() {
                None
            } else {
                Some(self.labels)
            },
            exposed_ports,
            host_config,
        })
    }
}

/// Everything needed to create the backend container.
#[derive(Debug, Clone)]
pub struct BackendContainerConfig {
    /// Container name
    pub name: String,
    /// Image name
    pub image: String,
    /// Labels
    pub labels: Option<HashMap<String, String>>,
    /// Exposed ports, as `port/proto`
    pub exposed_ports: Vec<String>,
    /// Host configuration
    pub host_config: HostConfig,
}

impl BackendContainerConfig {
    pub fn builder() -> BackendContainerConfigBuilder {
        BackendContainerConfigBuilder::new()
    }

    /// Host port a container port is published on, if any.
    pub fn published_port(&self, container_port: &str) -> Option<&str> {
        self.host_config
            .port_bindings
            .as_ref()?
            .get(container_port)?
            .as_ref()?
            .first()?
            .host_port
            .as_deref()
    }
}
