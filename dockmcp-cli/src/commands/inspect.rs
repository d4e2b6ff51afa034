// SPDX-License-Identifier: MIT
//! `dockmcp inspect`: `inspect_container` without the MCP envelope — the
//! full raw JSON, unlike the MCP tool's summarized view.

use anyhow::{Context, Result};

use dockmcp_core::domain::docker::DockerAdapter;
use dockmcp_core::domain::policy::Permission;
use dockmcp_core::infrastructure::config::DockMcpConfig;

use super::bootstrap;

pub async fn run(config: DockMcpConfig, container: String) -> Result<()> {
    let bootstrap = bootstrap(config)?;

    bootstrap
        .policy_engine
        .authorize_container(Permission::Inspect, &container)
        .map_err(|denial| anyhow::anyhow!(denial.reason().to_string()))?;

    let detail = bootstrap
        .docker
        .inspect(&container)
        .await
        .context("inspect failed")?;

    let text = serde_json::to_string_pretty(&detail.raw_json)?;
    println!("{}", bootstrap.masker.mask(&text));
    Ok(())
}
