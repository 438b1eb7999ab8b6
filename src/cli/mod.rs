//! CLI-specific functionality for the LucidLink MCP server
//!
//! This module contains all CLI-related code including argument parsing,
//! configuration discovery and the installation check.

pub mod args;
pub mod check;
pub mod config;

pub use args::{Args, Commands, ExecutionMode, RunConfig};
pub use check::{CheckReport, CheckResult, run_checks};
pub use config::{ConfigDiscovery, LoadedConfig};
