// SPDX-License-Identifier: MIT
//! `list_files` (spec.md §4.3): exec-based `ls` equivalent.

use std::time::Instant;

use serde_json::Value;

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
    let path = require_str(&arguments, "path")?;

    if let Err(denial) = ctx
        .policy_engine
        .authorize_container(Permission::Files, &container)
    {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "list_files",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    if let Err(denial) = ctx.policy_engine.authorize_path(&container, &path) {
        ctx.audit.record(AuditEvent::access_denied(
            ctx.session_id,
            "list_files",
            Some(container.clone()),
            denial.reason().to_string(),
            denial.detail(),
        ));
        return Ok(ToolCallResult::error(denial.reason().to_string()));
    }

    match ctx
        .docker
        .list_files(&container, &path, ctx.exec_timeout)
        .await
    {
        Ok(entries) => {
            let text = ctx.masker.mask(&entries.join("\n"));
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "list_files",
                Some(container),
                AuditResult::Success,
                start.elapsed().as_millis() as u64,
                None,
                Value::Null,
            ));
            Ok(ToolCallResult::ok(text))
        }
        Err(err) => {
            ctx.audit.record(AuditEvent::tool_call(
                ctx.session_id,
                "list_files",
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

    #[tokio::test]
    async fn lists_entries_joined_by_newline() {
        let docker = FakeDocker {
            list_files: Some(Ok(vec!["app.py".to_string(), "requirements.txt".to_string()])),
            ..Default::default()
        };
        let fixture = Fixture::new(permissive_policy(), docker);
        let args = serde_json::json!({"container": "demo-api", "path": "/workspace"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content[0].text, "app.py\nrequirements.txt");
    }

    #[tokio::test]
    async fn files_permission_disabled_denies_before_docker_call() {
        let mut policy = permissive_policy();
        policy.permissions.files = false;
        let fixture = Fixture::new(policy, FakeDocker::default());
        let args = serde_json::json!({"container": "demo-api", "path": "/workspace"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(result.is_error);
    }
}
