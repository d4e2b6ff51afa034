// SPDX-License-Identifier: MIT
//! `dockmcp stats`: `get_stats` without the MCP envelope.

use anyhow::{Context, Result};

use dockmcp_core::application::format::format_bytes_binary;
use dockmcp_core::domain::docker::DockerAdapter;
use dockmcp_core::domain::policy::Permission;
use dockmcp_core::infrastructure::config::DockMcpConfig;

use super::{bootstrap, STATS_TIMEOUT};

pub async fn run(config: DockMcpConfig, container: String) -> Result<()> {
    let bootstrap = bootstrap(config)?;

    bootstrap
        .policy_engine
        .authorize_container(Permission::Stats, &container)
        .map_err(|denial| anyhow::anyhow!(denial.reason().to_string()))?;

    let sample = bootstrap
        .docker
        .stats(&container, STATS_TIMEOUT)
        .await
        .context("stats failed")?;

    println!("cpu: {:.2}%", sample.cpu_percent);
    println!(
        "memory: {} / {}",
        format_bytes_binary(sample.memory.usage_bytes),
        format_bytes_binary(sample.memory.limit_bytes)
    );
    println!(
        "network: rx {} / tx {}",
        format_bytes_binary(sample.network.rx_bytes),
        format_bytes_binary(sample.network.tx_bytes)
    );
    Ok(())
}
