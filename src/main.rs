use anyhow::Context;
use lucidlink_mcp::cli::{Args, ConfigDiscovery, ExecutionMode, RunConfig, run_checks};
use lucidlink_mcp::container::DockerEngine;
use lucidlink_mcp::secrets::SecretProvider;
use lucidlink_mcp::server::{McpServer, serve_stdio};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mode = args.mode();

    // stdout carries protocol messages; logs go to stderr.
    let default_filter = if args.verbose {
        "lucidlink_mcp=debug"
    } else {
        "lucidlink_mcp=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match mode {
        ExecutionMode::Serve(config) => run_serve(config).await,
        ExecutionMode::Check(config) => run_check(config).await,
        ExecutionMode::ShowConfig { config_override } => {
            ConfigDiscovery::show_discovery_info(config_override.as_deref());
            Ok(())
        }
    }
}

async fn run_serve(run: RunConfig) -> anyhow::Result<()> {
    let loaded = ConfigDiscovery::load(run.config_override.as_deref())
        .context("Failed to load configuration")?;

    let secrets = loaded.config.secret_provider();
    if secrets.get_token().await.is_none() {
        warn!("No bearer token found. User will need to provide one.");
    }

    info!("Starting LucidLink MCP Server...");
    let mut server = McpServer::from_config(&loaded.config);
    serve_stdio(&mut server)
        .await
        .context("MCP transport failed")?;
    Ok(())
}

async fn run_check(run: RunConfig) -> anyhow::Result<()> {
    let loaded = ConfigDiscovery::load(run.config_override.as_deref())
        .context("Failed to load configuration")?;
    let engine = DockerEngine::new(loaded.config.engine_settings());
    let secrets = loaded.config.secret_provider();

    let report = run_checks(&engine, &secrets, &loaded).await;
    println!("{}", report.render());

    if !report.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
