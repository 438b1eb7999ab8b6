//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `serve`: Run the MCP server on stdin/stdout (the default)
//! - `check`: Verify the installation without starting the server
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    Serve(RunConfig),
    Check(RunConfig),
    ShowConfig { config_override: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub config_override: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "lucidlink-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "MCP server for the LucidLink admin API that manages its local API container"
)]
#[command(long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,
    /// Check Docker, the API image and the bearer token
    Check,
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> ExecutionMode {
        let run = RunConfig {
            config_override: self.config.clone(),
            verbose: self.verbose,
        };

        match self.command.unwrap_or(Commands::Serve) {
            Commands::Serve => ExecutionMode::Serve(run),
            Commands::Check => ExecutionMode::Check(run),
            Commands::ShowConfig => ExecutionMode::ShowConfig {
                config_override: run.config_override,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lucidlink-mcp").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_subcommand_serves() {
        let args = parse(&[]);
        assert_eq!(args.mode(), ExecutionMode::Serve(RunConfig::default()));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["check", "--config", "custom.toml", "-v"]);
        assert_eq!(
            args.mode(),
            ExecutionMode::Check(RunConfig {
                config_override: Some(PathBuf::from("custom.toml")),
                verbose: true,
            })
        );
    }

    #[test]
    fn test_show_config() {
        let args = parse(&["-c", "a.toml", "show-config"]);
        assert_eq!(
            args.mode(),
            ExecutionMode::ShowConfig {
                config_override: Some(PathBuf::from("a.toml"))
            }
        );
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        let result = Args::try_parse_from(["lucidlink-mcp", "run"]);
        assert!(result.is_err());
    }
}
