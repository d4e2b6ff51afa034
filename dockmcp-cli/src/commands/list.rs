// SPDX-License-Identifier: MIT
//! `dockmcp list`: containers visible under the configured allowlist.

use anyhow::{Context, Result};
use dockmcp_core::domain::docker::DockerAdapter;
use dockmcp_core::infrastructure::config::DockMcpConfig;

use super::bootstrap;

pub async fn run(config: DockMcpConfig) -> Result<()> {
    let bootstrap = bootstrap(config)?;
    let containers = bootstrap
        .docker
        .list_containers()
        .await
        .context("failed to list containers")?;

    let visible: Vec<_> = containers
        .into_iter()
        .filter(|c| bootstrap.policy_engine.policy().container_allowed(&c.name))
        .collect();

    println!("{}", serde_json::to_string_pretty(&visible)?);
    Ok(())
}
