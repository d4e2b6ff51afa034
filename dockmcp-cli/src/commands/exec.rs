// SPDX-License-Identifier: MIT
//! `dockmcp exec`: `exec_command` without the MCP envelope, plus the
//! `--dry-run` policy check (SPEC_FULL §11).

use anyhow::{Context, Result};
use colored::Colorize;

use dockmcp_core::domain::docker::DockerAdapter;
use dockmcp_core::domain::policy::Permission;
use dockmcp_core::infrastructure::config::DockMcpConfig;

use super::{bootstrap, EXEC_TIMEOUT};

pub async fn run(
    config: DockMcpConfig,
    container: String,
    command: Vec<String>,
    dangerously: bool,
    dry_run: bool,
) -> Result<()> {
    let bootstrap = bootstrap(config)?;
    let command_line = command.join(" ");

    if dry_run {
        let decision = bootstrap.policy_engine.policy().exec_allowed(&container, &command_line);
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "allowed": decision.allowed,
                "dangerous": decision.dangerous,
                "matched_template": decision.matched_template,
                "reason": decision.reason,
            }))?
        );
        return Ok(());
    }

    bootstrap
        .policy_engine
        .authorize_container(Permission::Exec, &container)
        .map_err(|denial| anyhow::anyhow!(denial.reason().to_string()))?;
    bootstrap
        .policy_engine
        .authorize_exec(&container, &command_line, dangerously)
        .map_err(|denial| anyhow::anyhow!(denial.reason().to_string()))?;

    let outcome = bootstrap
        .docker
        .exec(&container, &command, EXEC_TIMEOUT)
        .await
        .context("exec failed")?;

    let exit_code = if outcome.exit_code == 0 {
        outcome.exit_code.to_string().green()
    } else {
        outcome.exit_code.to_string().red()
    };
    println!("exit code: {exit_code}");
    print!("{}", bootstrap.masker.mask(&outcome.stdout));
    if !outcome.stderr.is_empty() {
        eprint!("{}", bootstrap.masker.mask(&outcome.stderr));
    }
    Ok(())
}
