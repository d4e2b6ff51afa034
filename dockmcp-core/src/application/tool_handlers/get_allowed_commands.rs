// SPDX-License-Identifier: MIT
//! `get_allowed_commands` (spec.md §4.3): `container` is optional; when
//! present, only whitelist entries whose container pattern matches it are
//! returned.

use std::time::Instant;

use serde_json::Value;

use crate::domain::audit::{AuditEvent, AuditResult};
use crate::domain::glob::glob_match;
use crate::domain::mcp::{JsonRpcError, ToolCallResult};

use super::HandlerContext;

pub async fn handle(
    ctx: &HandlerContext<'_>,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    let start = Instant::now();
    let container = arguments
        .get("container")
        .and_then(Value::as_str)
        .map(str::to_string);

    let policy = ctx.policy_engine.policy();
    let matches = |pattern: &str| container.as_deref().map_or(true, |c| glob_match(pattern, c));

    let whitelist: Vec<_> = policy
        .exec_whitelist
        .iter()
        .filter(|e| matches(&e.container_pattern))
        .collect();

    let dangerous: Vec<_> = if policy.dangerous_mode() {
        policy
            .exec_dangerously
            .commands
            .iter()
            .filter(|e| matches(&e.container_pattern))
            .collect()
    } else {
        Vec::new()
    };

    let payload = serde_json::json!({
        "whitelist": whitelist,
        "dangerous_mode_enabled": policy.dangerous_mode(),
        "dangerous": dangerous,
    });
    let text = ctx
        .masker
        .mask(&serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string()));

    ctx.audit.record(AuditEvent::tool_call(
        ctx.session_id,
        "get_allowed_commands",
        container,
        AuditResult::Success,
        start.elapsed().as_millis() as u64,
        None,
        Value::Null,
    ));

    Ok(ToolCallResult::ok(text))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{permissive_policy, FakeDocker, Fixture};
    use crate::domain::policy::ExecWhitelistEntry;

    fn policy_with_two_containers() -> crate::domain::policy::SecurityPolicy {
        let mut policy = permissive_policy();
        policy.exec_whitelist = vec![
            ExecWhitelistEntry {
                container_pattern: "demo-*".to_string(),
                templates: vec!["npm test".to_string()],
            },
            ExecWhitelistEntry {
                container_pattern: "prod-*".to_string(),
                templates: vec!["echo hi".to_string()],
            },
        ];
        policy
    }

    #[tokio::test]
    async fn without_container_filter_returns_the_whole_whitelist() {
        let fixture = Fixture::new(policy_with_two_containers(), FakeDocker::default());
        let result = super::handle(&fixture.ctx(), serde_json::Value::Null).await.unwrap();
        assert!(result.content[0].text.contains("demo-*"));
        assert!(result.content[0].text.contains("prod-*"));
    }

    #[tokio::test]
    async fn container_filter_narrows_to_matching_patterns_only() {
        let fixture = Fixture::new(policy_with_two_containers(), FakeDocker::default());
        let args = serde_json::json!({"container": "demo-api"});
        let result = super::handle(&fixture.ctx(), args).await.unwrap();
        assert!(result.content[0].text.contains("demo-*"));
        assert!(!result.content[0].text.contains("prod-*"));
    }

    #[tokio::test]
    async fn dangerous_commands_hidden_unless_dangerous_mode_enabled() {
        let fixture = Fixture::new(policy_with_two_containers(), FakeDocker::default());
        let result = super::handle(&fixture.ctx(), serde_json::Value::Null).await.unwrap();
        assert!(result.content[0].text.contains("\"dangerous_mode_enabled\": false"));
    }
}
