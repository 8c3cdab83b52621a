//! `gke-mcp`: MCP server for Google Kubernetes Engine.
//!
//! Speaks JSON-RPC on stdin/stdout; logs go to stderr.
//!
//! ```bash
//! gke-mcp --project my-project --location us-central1
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};

use cloud_client::{ProcessRunner, ProcessRunnerConfig, RestCloudApi};
use cloud_interface::{CommandRunner, Program};
use gke_config::Config;
use mcp_server::{GkeMcpServer, PromptDefinitions, ToolDefinitions};
use observability::{init_tracing, TracingConfig};

/// MCP server exposing GKE tools and prompts over stdio
#[derive(Parser, Debug)]
#[command(name = "gke-mcp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Default GCP project (overrides `gcloud config get core/project`)
    #[arg(long, env = "GKE_MCP_PROJECT")]
    project: Option<String>,

    /// Default location, region or zone (overrides the gcloud compute region/zone)
    #[arg(long, env = "GKE_MCP_LOCATION")]
    location: Option<String>,

    /// Path to the gcloud binary
    #[arg(long, default_value = "gcloud")]
    gcloud: PathBuf,

    /// Path to the kubectl binary
    #[arg(long, default_value = "kubectl")]
    kubectl: PathBuf,

    /// Path to the git binary
    #[arg(long, default_value = "git")]
    git: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the registered tools and prompts, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(
        TracingConfig::new("gke-mcp")
            .with_level(cli.log_level)
            .with_json(cli.json_logs),
    );

    if cli.list {
        print_registry();
        return Ok(());
    }

    let runner = Arc::new(ProcessRunner::with_config(ProcessRunnerConfig {
        gcloud_binary: cli.gcloud,
        kubectl_binary: cli.kubectl,
        git_binary: cli.git,
    }));

    if let Err(e) = runner.verify_binary(Program::Gcloud).await {
        warn!(error = %e, "gcloud is unavailable; most tools will fail");
    }

    let config = Config::resolve(env!("CARGO_PKG_VERSION"), runner.as_ref())
        .await
        .with_overrides(cli.project, cli.location);

    let shared_runner: Arc<dyn CommandRunner> = runner.clone();
    let api = RestCloudApi::new(shared_runner, config.user_agent())
        .context("failed to build Google Cloud API client")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        project = %config.default_project_id(),
        location = %config.default_location(),
        "Starting GKE MCP server"
    );

    let server = GkeMcpServer::with_shared(Arc::new(config), runner, Arc::new(api));
    server
        .serve_stdio()
        .await
        .context("MCP server terminated with an I/O error")?;

    Ok(())
}

fn print_registry() {
    println!("Tools:");
    for tool in ToolDefinitions::all().tools {
        println!("  {:<38} {}", tool.name, tool.description);
    }
    println!("Prompts:");
    for prompt in PromptDefinitions::all() {
        println!("  {:<38} {}", prompt.name, prompt.description);
    }
}
