// SPDX-License-Identifier: MIT
//! `list_containers` (spec.md §4.3): no arguments, no explicit permission
//! gate — results are simply filtered to the allowed-container set.

use std::time::Instant;

use serde_json::Value;

use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::mcp::{JsonRpcError, ToolCallResult};

use super::HandlerContext;

pub async fn handle(
    ctx: &HandlerContext<'_>,
    _arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();

    let containers = match ctx.docker.list_containers().await {
        Ok(containers) => containers,
        Err(err) => {
            let result = ToolCallResult::error(format!("docker adapter error: {err}"));
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "list_containers",
                None,
                AuditResult::Error,
                start.elapsed().as_millis() as u64,
                Some(err.to_string()),
                Value::Null,
            ));
            return Ok(result);
        }
    };

    let visible: Vec<_> = containers
        .into_iter()
        .filter(|c| ctx.policy_engine.policy().container_allowed(&c.name))
        .collect();

    let text = ctx
        .masker
        .mask(&serde_json::to_string(&visible).unwrap_or_else(|_| "[]".to_string()));

    ctx.audit.record(AuditEvent::tool_call(
        ctx.session_id,
        "list_containers",
        None,
        AuditResult::Success,
        start.elapsed().as_millis() as u64,
        None,
        serde_json::json!({"visible_count": visible.len()}),
    ));

    Ok(ToolCallResult::ok(text))
}
