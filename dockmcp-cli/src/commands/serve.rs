// SPDX-License-Identifier: MIT
//! `dockmcp serve`: binds the SSE/HTTP transport and runs until interrupted
//! (spec.md §4.4 graceful shutdown).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use dockmcp_core::application::masker::Masker;
use dockmcp_core::application::policy_engine::PolicyEngine;
use dockmcp_core::application::session_manager::SessionManager;
use dockmcp_core::domain::audit::{AuditSink, NullAuditSink};
use dockmcp_core::domain::docker::DockerAdapter;
use dockmcp_core::infrastructure::audit_sink::{FileAuditSink, FilteredAuditSink, StderrAuditSink};
use dockmcp_core::infrastructure::config::DockMcpConfig;
use dockmcp_core::infrastructure::docker_adapter::BollardDockerAdapter;
use dockmcp_core::infrastructure::transport::{router, AppState};

const EXEC_TIMEOUT: Duration = Duration::from_secs(30);
const STATS_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(config: DockMcpConfig, host_override: Option<String>, port_override: Option<u16>) -> Result<()> {
    let server_settings = config.server_settings();
    let audit_settings = config.audit_settings();

    let policy = Arc::new(config.into_policy());
    let masker = Arc::new(Masker::new(&policy).context("invalid output_masking pattern in config")?);
    let policy_engine = Arc::new(PolicyEngine::new(policy));
    let docker: Arc<dyn DockerAdapter> =
        Arc::new(BollardDockerAdapter::connect_local_defaults().context("failed to connect to Docker")?);

    let audit: Arc<dyn AuditSink> = match (audit_settings.enabled, audit_settings.file) {
        (false, _) => Arc::new(NullAuditSink),
        (true, Some(path)) => Arc::new(FilteredAuditSink::new(
            FileAuditSink::open(&path)
                .with_context(|| format!("failed to open audit file {}", path.display()))?,
            audit_settings.events,
        )),
        (true, None) => Arc::new(FilteredAuditSink::new(StderrAuditSink, audit_settings.events)),
    };

    let session_manager = Arc::new(SessionManager::new(
        policy_engine,
        masker,
        docker,
        audit,
        EXEC_TIMEOUT,
        STATS_TIMEOUT,
    ));

    let host = host_override.unwrap_or(server_settings.host);
    let port = port_override.unwrap_or(server_settings.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "dockmcp listening");

    let app = router(Arc::new(AppState {
        session_manager: session_manager.clone(),
    }));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(session_manager))
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal(session_manager: Arc<SessionManager>) {
    let _ = tokio::signal::ctrl_c().await;
    let summary = session_manager.uninitialized_probe_summary();
    if summary.is_empty() {
        info!("shutting down");
    } else {
        info!(%summary, "shutting down; uninitialized sessions by user agent");
    }
}
