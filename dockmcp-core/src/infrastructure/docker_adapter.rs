// SPDX-License-Identifier: MIT
//! Bollard-backed [`DockerAdapter`] (spec.md §4.5). Opaque to policy,
//! masking and sessions — it only talks to the Docker Engine API and
//! returns typed results or a typed error.

use std::time::Duration;

use bollard::container::{InspectContainerOptions, ListContainersOptions, LogsOutput, LogsOptions, StatsOptions};
use bollard::errors::Error as BollardError;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;

use crate::domain::docker::{
    ContainerSummary, DockerAdapter, DockerAdapterError, ExecOutcome, InspectDetail, LogQuery,
    MemorySample, NetworkIoSample, StatsSample,
};

/// Logs larger than this are truncated before being handed back to the
/// masker (spec.md §5).
const MAX_LOG_BYTES: usize = 10 * 1024 * 1024;

pub struct BollardDockerAdapter {
    docker: Docker,
}

impl BollardDockerAdapter {
    pub fn connect_local_defaults() -> Result<Self, DockerAdapterError> {
        let docker = Docker::connect_with_local_defaults().map_err(map_connect_error)?;
        Ok(Self { docker })
    }

    pub fn connect_unix(socket_path: &str) -> Result<Self, DockerAdapterError> {
        let docker = Docker::connect_with_unix(socket_path, 30, bollard::API_DEFAULT_VERSION)
            .map_err(map_connect_error)?;
        Ok(Self { docker })
    }

    pub async fn ping(&self) -> Result<(), DockerAdapterError> {
        self.docker.ping().await.map_err(map_bollard_error)?;
        Ok(())
    }
}

fn map_connect_error(err: BollardError) -> DockerAdapterError {
    DockerAdapterError::Transport(err.to_string())
}

fn map_bollard_error(err: BollardError) -> DockerAdapterError {
    match &err {
        BollardError::DockerResponseServerError { status_code, message } => {
            if *status_code == 404 {
                DockerAdapterError::NotFound(message.clone())
            } else if *status_code == 403 || *status_code == 401 {
                DockerAdapterError::PermissionDenied(message.clone())
            } else {
                DockerAdapterError::Transport(message.clone())
            }
        }
        other => DockerAdapterError::Transport(other.to_string()),
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T, DockerAdapterError>>,
) -> Result<T, DockerAdapterError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(DockerAdapterError::Timeout(timeout)),
    }
}

#[async_trait::async_trait]
impl DockerAdapter for BollardDockerAdapter {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockerAdapterError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(map_bollard_error)?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                name: c
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches('/')
                    .to_string(),
                id: c.id.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
                status: c.status.unwrap_or_default(),
                ports: c
                    .ports
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| match p.public_port {
                        Some(public) => format!("{}->{}/{}", public, p.private_port, p.typ.map(|t| t.to_string()).unwrap_or_default()),
                        None => format!("{}/{}", p.private_port, p.typ.map(|t| t.to_string()).unwrap_or_default()),
                    })
                    .collect(),
                labels: c.labels.unwrap_or_default(),
            })
            .collect())
    }

    async fn logs(&self, container: &str, query: LogQuery) -> Result<String, DockerAdapterError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: query.tail,
            since: query.since.and_then(|s| s.parse().ok()).unwrap_or(0),
            timestamps: false,
            ..Default::default()
        };
        let mut stream = self.docker.logs(container, Some(options));
        let mut out = String::new();
        let mut truncated = false;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_bollard_error)?;
            let text = match chunk {
                LogsOutput::StdOut { message } | LogsOutput::StdErr { message } => {
                    String::from_utf8_lossy(&message).into_owned()
                }
                LogsOutput::Console { message } | LogsOutput::StdIn { message } => {
                    String::from_utf8_lossy(&message).into_owned()
                }
            };
            if out.len() + text.len() > MAX_LOG_BYTES {
                let remaining = MAX_LOG_BYTES.saturating_sub(out.len()).min(text.len());
                let mut boundary = remaining;
                while boundary > 0 && !text.is_char_boundary(boundary) {
                    boundary -= 1;
                }
                out.push_str(&text[..boundary]);
                truncated = true;
                break;
            }
            out.push_str(&text);
        }
        if truncated {
            out.push_str("\n...[truncated at 10MiB]");
        }
        Ok(out)
    }

    async fn inspect(&self, container: &str) -> Result<InspectDetail, DockerAdapterError> {
        let detail = self
            .docker
            .inspect_container(container, None::<InspectContainerOptions>)
            .await
            .map_err(map_bollard_error)?;
        let raw_json = serde_json::to_value(detail)
            .map_err(|e| DockerAdapterError::Transport(e.to_string()))?;
        Ok(InspectDetail { raw_json })
    }

    async fn stats(
        &self,
        container: &str,
        timeout: Duration,
    ) -> Result<StatsSample, DockerAdapterError> {
        with_timeout(timeout, async {
            let options = StatsOptions {
                stream: false,
                one_shot: true,
            };
            let mut stream = self.docker.stats(container, Some(options));
            let sample = stream
                .next()
                .await
                .ok_or_else(|| DockerAdapterError::Transport("no stats sample returned".into()))?
                .map_err(map_bollard_error)?;

            let cpu_delta = sample
                .cpu_stats
                .cpu_usage
                .total_usage
                .saturating_sub(sample.precpu_stats.cpu_usage.total_usage) as f64;
            let sys_delta = sample
                .cpu_stats
                .system_cpu_usage
                .unwrap_or(0)
                .saturating_sub(sample.precpu_stats.system_cpu_usage.unwrap_or(0))
                as f64;
            let num_cpus = sample
                .cpu_stats
                .online_cpus
                .or_else(|| sample.cpu_stats.cpu_usage.percpu_usage.as_ref().map(|v| v.len() as u64))
                .unwrap_or(1) as f64;
            let cpu_percent = if sys_delta == 0.0 {
                0.0
            } else {
                (cpu_delta / sys_delta) * 100.0 * num_cpus
            };

            let memory_usage = sample.memory_stats.usage.unwrap_or(0);
            let memory_limit = sample.memory_stats.limit.unwrap_or(0);

            let (rx_bytes, tx_bytes) = sample
                .networks
                .unwrap_or_default()
                .values()
                .fold((0u64, 0u64), |(rx, tx), n| (rx + n.rx_bytes, tx + n.tx_bytes));

            Ok(StatsSample {
                cpu_percent,
                memory: MemorySample {
                    usage_bytes: memory_usage,
                    limit_bytes: memory_limit,
                },
                network: NetworkIoSample { rx_bytes, tx_bytes },
            })
        })
        .await
    }

    async fn exec(
        &self,
        container: &str,
        command: &[String],
        timeout: Duration,
    ) -> Result<ExecOutcome, DockerAdapterError> {
        with_timeout(timeout, async {
            let exec = self
                .docker
                .create_exec(
                    container,
                    CreateExecOptions {
                        attach_stdout: Some(true),
                        attach_stderr: Some(true),
                        cmd: Some(command.iter().map(String::as_str).collect()),
                        ..Default::default()
                    },
                )
                .await
                .map_err(map_bollard_error)?;

            let mut stdout = String::new();
            let mut stderr = String::new();
            if let StartExecResults::Attached { mut output, .. } =
                self.docker.start_exec(&exec.id, None).await.map_err(map_bollard_error)?
            {
                while let Some(msg) = output.next().await {
                    match msg.map_err(map_bollard_error)? {
                        bollard::container::LogOutput::StdOut { message } => {
                            stdout.push_str(&String::from_utf8_lossy(&message));
                        }
                        bollard::container::LogOutput::StdErr { message } => {
                            stderr.push_str(&String::from_utf8_lossy(&message));
                        }
                        _ => {}
                    }
                }
            }

            let inspect = self.docker.inspect_exec(&exec.id).await.map_err(map_bollard_error)?;
            Ok(ExecOutcome {
                exit_code: inspect.exit_code.unwrap_or(-1),
                stdout,
                stderr,
            })
        })
        .await
    }

    async fn read_file(
        &self,
        container: &str,
        path: &str,
        max_lines: u32,
        timeout: Duration,
    ) -> Result<String, DockerAdapterError> {
        let command = vec![
            "head".to_string(),
            "-n".to_string(),
            max_lines.to_string(),
            path.to_string(),
        ];
        let outcome = self.exec(container, &command, timeout).await?;
        if outcome.exit_code != 0 {
            return Err(DockerAdapterError::NotFound(format!(
                "{path}: {}",
                outcome.stderr.trim()
            )));
        }
        Ok(outcome.stdout)
    }

    async fn list_files(
        &self,
        container: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, DockerAdapterError> {
        let command = vec!["ls".to_string(), "-1A".to_string(), path.to_string()];
        let outcome = self.exec(container, &command, timeout).await?;
        if outcome.exit_code != 0 {
            return Err(DockerAdapterError::NotFound(format!(
                "{path}: {}",
                outcome.stderr.trim()
            )));
        }
        Ok(outcome.stdout.lines().map(str::to_string).collect())
    }
}

