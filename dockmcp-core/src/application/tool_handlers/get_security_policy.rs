// SPDX-License-Identifier: MIT
//! `get_security_policy` (spec.md §4.3): returns the effective policy as
//! structured text, with no argument and no permission gate — an MCP
//! client needs to be able to reason about the policy before it can know
//! which other tools are worth calling.

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
    let policy = ctx.policy_engine.policy();
    let text = ctx
        .masker
        .mask(&serde_json::to_string_pretty(policy).unwrap_or_else(|_| "{}".to_string()));

    ctx.audit.record(AuditEvent::tool_call(
        ctx.session_id,
        "get_security_policy",
        None,
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

    #[tokio::test]
    async fn returns_the_effective_policy_as_json() {
        let fixture = Fixture::new(permissive_policy(), FakeDocker::default());
        let result = super::handle(&fixture.ctx(), serde_json::Value::Null).await.unwrap();
        assert!(!result.is_error);
        let parsed: serde_json::Value = serde_json::from_str(&result.content[0].text).unwrap();
        assert_eq!(parsed["allowed_containers"], serde_json::json!(["*"]));
    }
}
