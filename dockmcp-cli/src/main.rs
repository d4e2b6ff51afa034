// SPDX-License-Identifier: MIT
//! # dockmcp
//!
//! `dockmcp serve` runs the broker's MCP transport (SSE + JSON-RPC over
//! HTTP). The other verbs — `list`, `logs`, `exec`, `inspect`, `stats` —
//! build the same `Policy`/`DockerAdapter` the server uses and print
//! straight to stdout, for operators who want to exercise the policy
//! without standing up an MCP client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{exec, inspect, list, logs, serve, stats};

/// DockMCP — security-enforcing broker for AI assistants to operate on Docker containers.
#[derive(Parser)]
#[command(name = "dockmcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the YAML security policy/config file.
    #[arg(short, long, global = true, env = "DOCKMCP_CONFIG", value_name = "FILE")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP SSE/HTTP transport.
    Serve {
        /// Override the config file's `server.host`.
        #[arg(long)]
        host: Option<String>,
        /// Override the config file's `server.port`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// List containers visible to the policy.
    List,
    /// Fetch a container's logs.
    Logs {
        container: String,
        #[arg(long, default_value = "200")]
        tail: String,
        #[arg(long)]
        since: Option<String>,
    },
    /// Run a command in a container, subject to the exec whitelist.
    Exec {
        container: String,
        /// The command line, e.g. `dockmcp exec demo-api -- npm test`.
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
        /// Consult `exec_dangerously` instead of the plain whitelist.
        #[arg(long)]
        dangerously: bool,
        /// Print the policy decision without invoking Docker.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a container's full `docker inspect` JSON.
    Inspect { container: String },
    /// Print one point-in-time CPU/memory/network sample.
    Stats { container: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = dockmcp_core::infrastructure::config::DockMcpConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Serve { host, port } => serve::run(config, host, port).await,
        Commands::List => list::run(config).await,
        Commands::Logs { container, tail, since } => logs::run(config, container, tail, since).await,
        Commands::Exec { container, command, dangerously, dry_run } => {
            exec::run(config, container, command, dangerously, dry_run).await
        }
        Commands::Inspect { container } => inspect::run(config, container).await,
        Commands::Stats { container } => stats::run(config, container).await,
    }
}

/// `-v` count maps onto a `tracing::Level` (SPEC_FULL §10.1): 0 → info,
/// 1-2 → debug, 3+ → trace.
fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 | 2 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("failed to build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
