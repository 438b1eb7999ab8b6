//! The MCP server: JSON-RPC method routing over the tool dispatcher.
//!
//! ## Architecture
//!
//! - [`protocol`]: JSON-RPC 2.0 and MCP message types
//! - [`transport`]: newline-delimited message loop over stdio
//! - [`tools`]: the tool catalogue and argument schemas
//! - [`dispatcher`]: runs tool calls against the session and the orchestrator
//! - [`session`]: the lazily created admin API client
//! - [`render`]: text rendering of tool results
//! - [`help`]: the help resource

pub mod dispatcher;
pub mod help;
pub mod protocol;
pub mod render;
pub mod session;
pub mod tools;
pub mod transport;

pub use dispatcher::{ToolDispatcher, ToolOutput};
pub use protocol::{McpError, McpRequest, McpResponse, ProtocolError};
pub use session::AdminSession;
pub use transport::{serve, serve_stdio};

use crate::config::ServerConfig;
use crate::container::{BackendOrchestrator, ContainerEngine, DockerEngine};
use crate::poll::{Clock, SystemClock};
use crate::secrets::SecretProvider;
use protocol::{
    CallToolResult, Content, InitializeResult, PROTOCOL_VERSION, ReadResourceParams, ServerInfo,
    ToolCallParams,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Name reported in the `initialize` handshake.
pub const SERVER_NAME: &str = "lucidlink-admin-api";

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Wire a server from explicit parts.
    pub fn with_parts(
        config: &ServerConfig,
        engine: Arc<dyn ContainerEngine>,
        secrets: Arc<dyn SecretProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = AdminSession::new(config.api_client_config(), secrets, clock.clone());
        let orchestrator = BackendOrchestrator::new(engine, clock, config.orchestrator_settings());
        Self::new(ToolDispatcher::new(session, orchestrator))
    }

    /// Docker engine, configured secret chain and the system clock.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(DockerEngine::new(config.engine_settings())),
            Arc::new(config.secret_provider()),
            Arc::new(SystemClock),
        )
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Answer one message. Notifications get `None`.
    pub async fn handle(&mut self, request: McpRequest) -> Option<McpResponse> {
        let Some(id) = request.id.clone() else {
            debug!("Notification {}", request.method);
            return None;
        };

        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            "resources/list" => Ok(json!({ "resources": [help::help_resource()] })),
            "resources/read" => read_resource(request.params),
            other => Err(McpError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => McpResponse::ok(id, value),
            Err(error) => McpResponse::err(id, error),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);

        if let Some(client) = params.and_then(|p| p.get("clientInfo")) {
            info!("Client connected: {}", client);
        }

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: json!({ "tools": {}, "resources": {} }),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    async fn call_tool(&mut self, params: Option<Value>) -> Result<Value, McpError> {
        let params: ToolCallParams = params
            .ok_or_else(|| McpError::invalid_params("Missing tool call parameters"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string()))
            })?;

        let arguments = match params.arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(McpError::invalid_params("Tool arguments must be an object")),
        };

        let output = self.dispatcher.call(&params.name, &arguments).await;
        let result = CallToolResult {
            content: vec![Content::text(output.text)],
            is_error: output.is_error,
        };
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }
}

fn read_resource(params: Option<Value>) -> Result<Value, McpError> {
    let params: ReadResourceParams = params
        .ok_or_else(|| McpError::invalid_params("Missing resource uri"))
        .and_then(|p| serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string())))?;

    match help::read(&params.uri) {
        Some(contents) => Ok(json!({ "contents": [contents] })),
        None => Err(McpError::invalid_params(format!(
            "Unknown resource: {}",
            params.uri
        ))),
    }
}
