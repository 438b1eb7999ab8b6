//! # LucidLink MCP
//!
//! A Model Context Protocol server that exposes the LucidLink Admin API as
//! tools. The admin API is served by a container on the local machine; the
//! server keeps that container (and the container engine) running on demand
//! before every API call.
//!
//! ## Architecture Overview
//!
//! - **[`server`]**: JSON-RPC over stdio, tool catalogue and dispatch
//! - **[`api`]**: HTTP client for the admin API with rate limiting and error classification
//! - **[`container`]**: container engine binding and the backend container orchestrator
//! - **[`validation`]**: checks on names and emails before anything is sent
//! - **[`secrets`]**: bearer token lookup from the environment or the macOS Keychain
//! - **[`config`]**: TOML configuration
//!
//! ## Features
//!
//! ### 🐳 Self-managed backend
//! - **Engine start**: launches Docker Desktop when it is installed but not running
//! - **Image provisioning**: pulls the API image the first time it is needed
//! - **Container lifecycle**: creates, restarts, stops and tails the API container
//!
//! ### 🔐 Admin API access
//! - **Sliding-window rate limit**: at most ten calls a minute per client
//! - **Error classification**: every failure carries a kind and a readable message
//! - **Redacted credentials**: the bearer token never appears in logs or debug output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lucidlink_mcp::config::ServerConfig;
//! use lucidlink_mcp::server::{McpServer, serve_stdio};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = McpServer::from_config(&ServerConfig::default());
//!     serve_stdio(&mut server).await?;
//!     Ok(())
//! }
//! ```

/// Admin API client.
///
/// Rate limiting, request building and classification of every failure
/// into an [`error::ErrorKind`].
pub mod api;

/// Container engine binding and backend orchestration.
pub mod container;

/// MCP server over stdio.
pub mod server;

/// Name and email checks run before a request is built.
pub mod validation;

/// Bearer token sources.
pub mod secrets;

/// TOML configuration.
pub mod config;

/// Error classification shared by the API client and the orchestrator.
pub mod error;

/// Clock abstraction and bounded polling.
pub mod poll;

/// Environment constants and path utilities.
///
/// Centralizes all hardcoded names, ports and paths used throughout
/// the application for easier maintenance and consistency.
pub mod env;

// Re-export main API types
pub use api::{ApiClient, ApiClientConfig, ApiResult, Credential};

// Re-export container types
pub use container::{BackendOrchestrator, ContainerEngine, DockerEngine, OrchestratorSettings};

// Re-export error types
pub use error::{ClassifiedError, ErrorKind};

// Re-export server types
pub use server::{McpServer, ToolDispatcher};

// CLI module for command-line interface
pub mod cli;
