// SPDX-License-Identifier: MIT
//! Shared bring-up for every verb except `serve`: build the policy engine,
//! masker, and a live Docker adapter straight from the config file, no HTTP
//! involved (SPEC_FULL §0).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use dockmcp_core::application::masker::Masker;
use dockmcp_core::application::policy_engine::PolicyEngine;
use dockmcp_core::infrastructure::config::DockMcpConfig;
use dockmcp_core::infrastructure::docker_adapter::BollardDockerAdapter;

pub mod exec;
pub mod inspect;
pub mod list;
pub mod logs;
pub mod serve;
pub mod stats;

/// Exec/read_file/list_files timeout for the direct-verb path, matching
/// `serve`'s default (spec.md §5 names no fixed number, so both paths
/// share one constant).
pub(crate) const EXEC_TIMEOUT: Duration = Duration::from_secs(30);
/// `stats` is bounded tighter — spec.md §5's "5s budget" for one sample.
pub(crate) const STATS_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Bootstrap {
    pub policy_engine: PolicyEngine,
    pub masker: Masker,
    pub docker: BollardDockerAdapter,
}

pub(crate) fn bootstrap(config: DockMcpConfig) -> Result<Bootstrap> {
    let policy = Arc::new(config.into_policy());
    let masker = Masker::new(&policy).context("invalid output_masking pattern in config")?;
    let policy_engine = PolicyEngine::new(policy);
    let docker =
        BollardDockerAdapter::connect_local_defaults().context("failed to connect to Docker")?;
    Ok(Bootstrap {
        policy_engine,
        masker,
        docker,
    })
}
