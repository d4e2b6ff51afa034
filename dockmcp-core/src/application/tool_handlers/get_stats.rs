// SPDX-License-Identifier: MIT
//! `get_stats` (spec.md §4.3, §5): one sample under a 5s budget.

use std::time::Instant;

use serde_json::Value;

use crate::application::format::format_bytes_binary;
use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::mcp::{JsonRpcError, ToolCallResult};
use crate::domain::policy::Permission;

use super::{require_str, HandlerContext};

pub async fn handle(
    ctx: &HandlerContext<'_>,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();
    let container = require_str(&arguments, "container")?;

    if let Err(denial) = ctx
        .policy_engine
        .authorize_container(Permission::Stats, &container)
    {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "get_stats",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    match ctx.docker.stats(&container, ctx.stats_timeout).await {
        Ok(sample) => {
            let text = format!(
                "cpu: {:.2}%\nmemory: {} / {}\nnetwork rx: {}\nnetwork tx: {}",
                sample.cpu_percent,
                format_bytes_binary(sample.memory.usage_bytes),
                format_bytes_binary(sample.memory.limit_bytes),
                format_bytes_binary(sample.network.rx_bytes),
                format_bytes_binary(sample.network.tx_bytes),
            );
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "get_stats",
                Some(container),
                AuditResult::Success,
                start.elapsed().as_millis() as u64,
                None,
                Value::Null,
            ));
            Ok(ToolCallResult::ok(ctx.masker.mask(&text)))
        }
        Err(err) => {
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "get_stats",
                Some(container),
                AuditResult::Error,
                start.elapsed().as_millis() as u64,
                Some(err.to_string()),
                Value::Null,
            ));
            Ok(ToolCallResult::error(ctx.masker.mask(&err.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{permissive_policy, FakeDocker, Fixture};
    use crate::domain::docker::{DockerAdapterError, MemorySample, NetworkIoSample, StatsSample};

    #[tokio::test]
    async fn success_formats_cpu_and_binary_memory_units() {
        let docker = FakeDocker {
            stats: Some(Ok(StatsSample {
                cpu_percent: 12.5,
                memory: MemorySample {
                    usage_bytes: 1024 * 1024,
                    limit_bytes: 2 * 1024 * 1024,
                },
                network: NetworkIoSample {
                    rx_bytes: 1024,
                    tx_bytes: 2048,
                },
            })),
            ..Default::default()
        };
        let fixture = Fixture::new(permissive_policy(), docker);
        let args = serde_json::json!({"container": "demo-api"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("12.50%"));
        assert!(result.content[0].text.contains("1.0 MiB"));
    }

    #[tokio::test]
    async fn adapter_error_is_surfaced_as_a_tool_error() {
        let docker = FakeDocker {
            stats: Some(Err(DockerAdapterError::NotFound("demo-api".to_string()))),
            ..Default::default()
        };
        let fixture = Fixture::new(permissive_policy(), docker);
        let args = serde_json::json!({"container": "demo-api"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(result.is_error);
    }
}
