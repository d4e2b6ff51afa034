// SPDX-License-Identifier: MIT
//! `dockmcp logs`: `get_logs` without the MCP envelope. `follow` is not
//! exposed — spec.md's own open-question resolution rejects it outright.

use anyhow::{Context, Result};

use dockmcp_core::domain::docker::{DockerAdapter, LogQuery};
use dockmcp_core::domain::policy::Permission;
use dockmcp_core::infrastructure::config::DockMcpConfig;

use super::bootstrap;

pub async fn run(
    config: DockMcpConfig,
    container: String,
    tail: String,
    since: Option<String>,
) -> Result<()> {
    let bootstrap = bootstrap(config)?;

    bootstrap
        .policy_engine
        .authorize_container(Permission::Logs, &container)
        .map_err(|denial| anyhow::anyhow!(denial.reason().to_string()))?;

    let body = bootstrap
        .docker
        .logs(&container, LogQuery { tail, since })
        .await
        .context("failed to fetch logs")?;

    println!("{}", bootstrap.masker.mask(&body));
    Ok(())
}
