// SPDX-License-Identifier: MIT
//! The Docker adapter's port (spec.md §4.5): a thin typed surface over
//! container engine primitives. Opaque to the policy/masking/session
//! layers — it returns raw results and knows nothing about sessions,
//! policy, or masking.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerAdapterError {
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub name: String,
    pub id: String,
    pub image: String,
    pub state: String,
    pub status: String,
    pub ports: Vec<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub tail: String,
    pub since: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemorySample {
    pub usage_bytes: u64,
    pub limit_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NetworkIoSample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// A single point-in-time stats sample (spec.md §4.3, §5 — 5s budget).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatsSample {
    pub cpu_percent: f64,
    pub memory: MemorySample,
    pub network: NetworkIoSample,
}

#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct InspectDetail {
    pub raw_json: serde_json::Value,
}

/// Port consumed by the application layer. Implementations take a
/// cancellable context (the caller's `tokio_util::sync::CancellationToken`
/// or an ambient deadline) and return a typed error distinguishing
/// not-found / permission / transport / timeout (spec.md §4.5).
#[async_trait]
pub trait DockerAdapter: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockerAdapterError>;

    async fn logs(
        &self,
        container: &str,
        query: LogQuery,
    ) -> Result<String, DockerAdapterError>;

    async fn inspect(&self, container: &str) -> Result<InspectDetail, DockerAdapterError>;

    async fn stats(
        &self,
        container: &str,
        timeout: Duration,
    ) -> Result<StatsSample, DockerAdapterError>;

    async fn exec(
        &self,
        container: &str,
        command: &[String],
        timeout: Duration,
    ) -> Result<ExecOutcome, DockerAdapterError>;

    /// `cat`-equivalent bounded by `max_lines`, implemented via `exec` in
    /// the bollard adapter (spec.md §4.3 `read_file`).
    async fn read_file(
        &self,
        container: &str,
        path: &str,
        max_lines: u32,
        timeout: Duration,
    ) -> Result<String, DockerAdapterError>;

    /// `ls`-equivalent, also implemented via `exec`.
    async fn list_files(
        &self,
        container: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, DockerAdapterError>;
}
