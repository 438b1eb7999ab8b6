//! Shared fixtures for integration tests: a canned HTTP server standing in
//! for the admin API, and an in-memory container engine.

#![allow(dead_code)]

use async_trait::async_trait;
use lucidlink_mcp::container::{
    BackendContainerConfig, ContainerEngine, ContainerError, ContainerInfo, RuntimeStatus,
};
use lucidlink_mcp::secrets::SecretProvider;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// One request as the canned server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Route = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

/// HTTP/1.1 server answering every request through `route`.
pub struct CannedServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl CannedServer {
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = seen.clone();
                let route = route.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut reader = BufReader::new(read);
                    let Some(request) = read_request(&mut reader).await else {
                        return;
                    };
                    let (status, body) = route(&request);
                    seen.lock().unwrap().push(request);

                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(status),
                        body.len(),
                        body
                    );
                    let _ = write.write_all(response.as_bytes()).await;
                    let _ = write.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request<R>(reader: &mut BufReader<R>) -> Option<Recorded>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.ok()?;

    Some(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        429 => "Too Many Requests",
        _ => "Error",
    }
}

/// Engine that is installed, running and has the image; containers live in memory.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    container: Mutex<Option<ContainerInfo>>,
}

impl InMemoryEngine {
    pub fn container(&self) -> Option<ContainerInfo> {
        self.container.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerEngine for InMemoryEngine {
    fn is_installed(&self) -> bool {
        true
    }

    async fn ping(&self) -> bool {
        true
    }

    async fn launch(&self) -> lucidlink_mcp::container::Result<()> {
        Ok(())
    }

    async fn inspect_container(
        &self,
        name: &str,
    ) -> lucidlink_mcp::container::Result<Option<ContainerInfo>> {
        Ok(self.container().filter(|c| c.name == name))
    }

    async fn image_exists(&self, _image: &str) -> lucidlink_mcp::container::Result<bool> {
        Ok(true)
    }

    async fn pull_image(&self, _image: &str) -> lucidlink_mcp::container::Result<()> {
        Ok(())
    }

    async fn create_container(
        &self,
        config: &BackendContainerConfig,
    ) -> lucidlink_mcp::container::Result<String> {
        let id = "abcdef0123456789".to_string();
        *self.container.lock().unwrap() = Some(ContainerInfo {
            id: id.clone(),
            name: config.name.clone(),
            status: RuntimeStatus::Created,
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> lucidlink_mcp::container::Result<()> {
        match self.container.lock().unwrap().as_mut() {
            Some(container) if container.id == id => {
                container.status = RuntimeStatus::Running;
                Ok(())
            }
            _ => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn stop_container(&self, id: &str, _timeout_secs: i64) -> lucidlink_mcp::container::Result<()> {
        match self.container.lock().unwrap().as_mut() {
            Some(container) if container.id == id => {
                container.status = RuntimeStatus::Stopped;
                Ok(())
            }
            _ => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn logs(&self, _id: &str, _tail: usize) -> lucidlink_mcp::container::Result<String> {
        Ok(String::new())
    }
}

/// Secret provider returning a fixed token.
pub struct FixedToken(pub Option<&'static str>);

#[async_trait]
impl SecretProvider for FixedToken {
    async fn get_token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
