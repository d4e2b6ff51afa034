// SPDX-License-Identifier: MIT
//! `exec_command` (spec.md §4.3): `dangerously` selects which whitelist is
//! consulted (see `PolicyEngine::authorize_exec`).

use std::time::Instant;

use serde_json::Value;

use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::command_match::tokenize;
use crate::domain::mcp::{JsonRpcError, ToolCallResult};
use crate::domain::policy::Permission;

use super::{optional_bool, require_str, HandlerContext};

pub async fn handle(
    ctx: &HandlerContext<'_>,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();
    let container = require_str(&arguments, "container")?;
    let command = require_str(&arguments, "command")?;
    let dangerously = optional_bool(&arguments, "dangerously", false);

    if let Err(denial) = ctx
        .policy_engine
        .authorize_container(Permission::Exec, &container)
    {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "exec_command",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    let decision = match ctx
        .policy_engine
        .authorize_exec(&container, &command, dangerously)
    {
        Ok(decision) => decision,
        Err(denial) => {
            ctx.audit.record(AuditEvent::access_denied(
                ctx.session_id,
                "exec_command",
                Some(container.clone()),
                denial.reason().to_string(),
                denial.detail(),
            ));
            return Ok(ToolCallResult::error(denial.reason().to_string()));
        }
    };

    let tokens: Vec<String> = tokenize(&command).into_iter().map(str::to_string).collect();
    match ctx.docker.exec(&container, &tokens, ctx.exec_timeout).await {
        Ok(outcome) => {
            let text = format!(
                "exit_code: {}\nstdout:\n{}\nstderr:\n{}",
                outcome.exit_code, outcome.stdout, outcome.stderr
            );
            let masked = ctx.masker.mask(&text);
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "exec_command",
                Some(container),
                AuditResult::Success,
                start.elapsed().as_millis() as u64,
                None,
                serde_json::json!({"dangerous": decision.dangerous, "matched_template": decision.matched_template}),
            ));
            Ok(ToolCallResult::ok(masked))
        }
        Err(err) => {
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "exec_command",
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
