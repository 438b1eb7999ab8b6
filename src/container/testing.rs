//! Scripted [`ContainerEngine`] used by unit tests.

use crate::container::{
    BackendContainerConfig, ContainerEngine, ContainerError, ContainerInfo, Result, RuntimeStatus,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the fake engine reports and how it reacts.
#[derive(Debug, Default)]
pub struct Script {
    pub installed: bool,
    pub engine_up: bool,
    /// After a launch, the engine answers once this many pings have been made.
    /// `None` means it never comes up.
    pub up_after_pings: Option<u32>,
    pub launch_error: Option<String>,
    pub image_present: bool,
    pub pull_error: Option<String>,
    pub container: Option<ContainerInfo>,
    pub create_error: Option<String>,
    pub start_error: Option<String>,
    pub logs: String,
    launched: bool,
    pings_since_launch: u32,
}

impl Script {
    /// Engine installed and running, image present, no container yet.
    pub fn ready() -> Self {
        Self {
            installed: true,
            engine_up: true,
            image_present: true,
            ..Default::default()
        }
    }

    pub fn with_container(mut self, status: RuntimeStatus) -> Self {
        self.container = Some(ContainerInfo {
            id: "0123456789abcdef".to_string(),
            name: crate::env::container::CONTAINER_NAME.to_string(),
            status,
        });
        self
    }
}

/// Counters for every engine call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Calls {
    pub pings: u32,
    pub launches: u32,
    pub inspects: u32,
    pub image_checks: u32,
    pub pulls: u32,
    pub creates: u32,
    pub starts: u32,
    pub stops: u32,
    pub log_reads: u32,
}

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    script: Mutex<Script>,
    calls: Mutex<Calls>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn container(&self) -> Option<ContainerInfo> {
        self.script.lock().unwrap().container.clone()
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.calls.lock().unwrap());
    }
}

#[async_trait]
impl ContainerEngine for ScriptedEngine {
    fn is_installed(&self) -> bool {
        self.script.lock().unwrap().installed
    }

    async fn ping(&self) -> bool {
        self.record(|c| c.pings += 1);
        let mut script = self.script.lock().unwrap();
        if script.engine_up {
            return true;
        }
        if script.launched {
            script.pings_since_launch += 1;
            if let Some(needed) = script.up_after_pings
                && script.pings_since_launch >= needed
            {
                script.engine_up = true;
            }
        }
        script.engine_up
    }

    async fn launch(&self) -> Result<()> {
        self.record(|c| c.launches += 1);
        let mut script = self.script.lock().unwrap();
        if let Some(error) = &script.launch_error {
            return Err(ContainerError::LaunchError(error.clone()));
        }
        script.launched = true;
        Ok(())
    }

    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>> {
        self.record(|c| c.inspects += 1);
        let script = self.script.lock().unwrap();
        Ok(script.container.clone().filter(|c| c.name == name))
    }

    async fn image_exists(&self, _image: &str) -> Result<bool> {
        self.record(|c| c.image_checks += 1);
        Ok(self.script.lock().unwrap().image_present)
    }

    async fn pull_image(&self, _image: &str) -> Result<()> {
        self.record(|c| c.pulls += 1);
        let mut script = self.script.lock().unwrap();
        if let Some(error) = &script.pull_error {
            return Err(ContainerError::PullError(error.clone()));
        }
        script.image_present = true;
        Ok(())
    }

    async fn create_container(&self, config: &BackendContainerConfig) -> Result<String> {
        self.record(|c| c.creates += 1);
        let mut script = self.script.lock().unwrap();
        if let Some(error) = &script.create_error {
            return Err(ContainerError::Other(error.clone()));
        }
        let id = "feedfacecafe0001".to_string();
        script.container = Some(ContainerInfo {
            id: id.clone(),
            name: config.name.clone(),
            status: RuntimeStatus::Created,
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record(|c| c.starts += 1);
        let mut script = self.script.lock().unwrap();
        if let Some(error) = &script.start_error {
            return Err(ContainerError::Other(error.clone()));
        }
        match script.container.as_mut() {
            Some(container) if container.id == id => {
                container.status = RuntimeStatus::Running;
                Ok(())
            }
            _ => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn stop_container(&self, id: &str, _timeout_secs: i64) -> Result<()> {
        self.record(|c| c.stops += 1);
        let mut script = self.script.lock().unwrap();
        match script.container.as_mut() {
            Some(container) if container.id == id => {
                container.status = RuntimeStatus::Stopped;
                Ok(())
            }
            _ => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn logs(&self, _id: &str, tail: usize) -> Result<String> {
        self.record(|c| c.log_reads += 1);
        let script = self.script.lock().unwrap();
        let lines: Vec<&str> = script.logs.lines().collect();
        let start = lines.len().saturating_sub(tail);
        Ok(lines[start..].join("\n"))
    }
}
