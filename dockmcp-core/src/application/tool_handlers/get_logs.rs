// SPDX-License-Identifier: MIT
//! `get_logs` (spec.md §4.3): `container` required, `tail` default "100",
//! `since` optional, `follow` rejected outright (Open Question resolved in
//! SPEC_FULL §12).

use std::time::Instant;

use serde_json::Value;

use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::docker::LogQuery;
use crate::domain::mcp::{JsonRpcError, ToolCallResult};
use crate::domain::policy::Permission;

use super::{optional_bool, optional_str, require_str, HandlerContext};

pub async fn handle(
    ctx: &HandlerContext<'_>,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();
    let container = require_str(&arguments, "container")?;
    let tail = optional_str(&arguments, "tail", "100");
    let since = arguments
        .get("since")
        .and_then(Value::as_str)
        .map(str::to_string);
    let follow = optional_bool(&arguments, "follow", false);

    if let Err(denial) = ctx.policy_engine.authorize_container(Permission::Logs, &container) {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "get_logs",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    if follow {
        let reason = "get_logs does not support follow=true";
        ctx.audit.record(AuditEvent::tool_call(
            ctx.session_id,
            "get_logs",
            Some(container),
            AuditResult::Error,
            start.elapsed().as_millis() as u64,
            Some(reason.to_string()),
            Value::Null,
        ));
        return Ok(ToolCallResult::error(reason));
    }

    let result = ctx
        .docker
        .logs(&container, LogQuery { tail, since })
        .await;

    match result {
        Ok(body) => {
            let masked = ctx.masker.mask(&body);
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "get_logs",
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
                "get_logs",
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
