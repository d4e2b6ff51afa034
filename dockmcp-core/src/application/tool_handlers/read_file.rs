// SPDX-License-Identifier: MIT
//! `read_file` (spec.md §4.3): exec-based `cat` equivalent bounded by
//! `max_lines` (default 1000).

use std::time::Instant;

use serde_json::Value;

use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::mcp::{JsonRpcError, ToolCallResult};
use crate::domain::policy::Permission;

use super::{optional_u32, require_str, HandlerContext};

pub async fn handle(
    ctx: &HandlerContext<'_>,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();
    let container = require_str(&arguments, "container")?;
    let path = require_str(&arguments, "path")?;
    let max_lines = optional_u32(&arguments, "max_lines", 1000);

    if let Err(denial) = ctx
        .policy_engine
        .authorize_container(Permission::Files, &container)
    {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "read_file",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    if let Err(denial) = ctx.policy_engine.authorize_path(&container, &path) {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "read_file",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    match ctx
        .docker
        .read_file(&container, &path, max_lines, ctx.exec_timeout)
        .await
    {
        Ok(body) => {
            let masked = ctx.masker.mask(&body);
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "read_file",
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
                "read_file",
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
    use crate::domain::policy::BlockedPathRule;

    #[tokio::test]
    async fn blocked_path_is_denied_before_touching_docker() {
        let mut policy = permissive_policy();
        policy.blocked_paths = vec![BlockedPathRule {
            pattern: "/etc/**".to_string(),
            containers: vec![],
        }];
        let fixture = Fixture::new(policy, FakeDocker::default());
        let args = serde_json::json!({"container": "demo-api", "path": "/etc/passwd"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn allowed_path_returns_masked_contents() {
        let docker = FakeDocker {
            read_file: Some(Ok("hello world".to_string())),
            ..Default::default()
        };
        let fixture = Fixture::new(permissive_policy(), docker);
        let args = serde_json::json!({"container": "demo-api", "path": "/workspace/app.py"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content[0].text, "hello world");
    }
}
