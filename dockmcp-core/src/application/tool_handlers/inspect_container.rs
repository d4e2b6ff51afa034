// SPDX-License-Identifier: MIT
//! `inspect_container` (spec.md §4.3): `format` is `json` or `summary`
//! (default `summary`).

use std::time::Instant;

use serde_json::Value;

use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::mcp::{JsonRpcError, ToolCallResult};
use crate::domain::policy::Permission;

use super::{optional_str, require_str, HandlerContext};

pub async fn handle(
    ctx: &HandlerContext<'_>,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();
    let container = require_str(&arguments, "container")?;
    let format = optional_str(&arguments, "format", "summary");

    if let Err(denial) = ctx
        .policy_engine
        .authorize_container(Permission::Inspect, &container)
    {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "inspect_container",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    match ctx.docker.inspect(&container).await {
        Ok(detail) => {
            let text = if format == "json" {
                serde_json::to_string_pretty(&detail.raw_json)
                    .unwrap_or_else(|_| detail.raw_json.to_string())
            } else {
                summarize(&detail.raw_json)
            };
            let masked = ctx.masker.mask(&text);
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "inspect_container",
                Some(container),
                AuditResult::Success,
                start.elapsed().as_millis() as u64,
                None,
                Value::Null,
            ));
            Ok(ToolCallResult::ok(masked))
        }
        Err(err) => {
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "inspect_container",
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

fn summarize(raw: &Value) -> String {
    let id = raw.get("Id").and_then(Value::as_str).unwrap_or("unknown");
    let name = raw
        .get("Name")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .trim_start_matches('/');
    let image = raw
        .pointer("/Config/Image")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let status = raw
        .pointer("/State/Status")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let started_at = raw
        .pointer("/State/StartedAt")
        .and_then(Value::as_str)
        .unwrap_or("");

    format!(
        "name: {name}\nid: {id}\nimage: {image}\nstate: {status}\nstarted_at: {started_at}"
    )
}
