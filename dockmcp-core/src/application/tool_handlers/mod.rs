// SPDX-License-Identifier: MIT
//! One module per exposed MCP tool (spec.md §4.3). Every handler follows
//! the same seven-step contract: validate arguments, check permission,
//! check container scope, check any tool-specific rule, invoke the
//! adapter, mask the output, emit a `tool_call` audit event.

mod exec_command;
mod get_allowed_commands;
mod get_logs;
mod get_security_policy;
mod get_stats;
mod inspect_container;
mod list_containers;
mod list_files;
mod read_file;

use std::time::Duration;

use serde_json::Value;

use crate::application::masker::Masker;
use crate::application::policy_engine::PolicyEngine;
use crate::domain::audit::AuditSink;
use crate::domain::docker::DockerAdapter;
use crate::domain::mcp::{JsonRpcError, JsonRpcErrorCode, ToolCallResult};
use crate::domain::session::SessionId;

/// Everything a tool handler needs, borrowed for the lifetime of one call.
pub struct HandlerContext<'a> {
    pub policy_engine: &'a PolicyEngine,
    pub masker: &'a Masker,
    pub docker: &'a (dyn DockerAdapter + 'a),
    pub audit: &'a (dyn AuditSink + 'a),
    pub session_id: SessionId,
    pub exec_timeout: Duration,
    pub stats_timeout: Duration,
}

/// Routes a `tools/call` by name to its handler. Unknown tool names are a
/// JSON-RPC `method not found`, not a tool-level error, since the tool
/// registry is fixed and known to the client via `tools/list`.
pub async fn dispatch(
    ctx: &HandlerContext<'_>,
    name: &str,
    arguments: Value,
) -> Result<ToolCallResult, JsonRpcError> {
    match name {
        "list_containers" => list_containers::handle(ctx, arguments).await,
        "get_logs" => get_logs::handle(ctx, arguments).await,
        "inspect_container" => inspect_container::handle(ctx, arguments).await,
        "get_stats" => get_stats::handle(ctx, arguments).await,
        "exec_command" => exec_command::handle(ctx, arguments).await,
        "read_file" => read_file::handle(ctx, arguments).await,
        "list_files" => list_files::handle(ctx, arguments).await,
        "get_security_policy" => get_security_policy::handle(ctx, arguments).await,
        "get_allowed_commands" => get_allowed_commands::handle(ctx, arguments).await,
        other => Err(JsonRpcErrorCode::MethodNotFound.into_error(format!("unknown tool `{other}`"))),
    }
}

/// Names every tool this broker exposes, for `tools/list`.
pub const TOOL_NAMES: &[&str] = &[
    "list_containers",
    "get_logs",
    "inspect_container",
    "get_stats",
    "exec_command",
    "read_file",
    "list_files",
    "get_security_policy",
    "get_allowed_commands",
];

pub(super) fn require_str(args: &Value, field: &str) -> Result<String, JsonRpcError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            JsonRpcErrorCode::InvalidParams
                .into_error(format!("missing or invalid required argument `{field}`"))
        })
}

pub(super) fn optional_str(args: &Value, field: &str, default: &str) -> String {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

pub(super) fn optional_bool(args: &Value, field: &str, default: bool) -> bool {
    args.get(field).and_then(Value::as_bool).unwrap_or(default)
}

pub(super) fn optional_u32(args: &Value, field: &str, default: u32) -> u32 {
    args.get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Shared fixtures for the per-handler test modules. `FakeDocker` lets each
/// test configure exactly the one operation it exercises; every other
/// method panics if called, so a test that forgets to check a permission
/// gate first fails loudly instead of silently hitting a stub `Ok`.
#[cfg(test)]
pub(super) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::application::masker::Masker;
    use crate::application::policy_engine::PolicyEngine;
    use crate::domain::audit::NullAuditSink;
    use crate::domain::docker::{
        ContainerSummary, DockerAdapter, DockerAdapterError, ExecOutcome, InspectDetail, LogQuery,
        StatsSample,
    };
    use crate::domain::policy::SecurityPolicy;
    use crate::domain::session::SessionId;

    use super::HandlerContext;

    #[derive(Default)]
    pub struct FakeDocker {
        pub list_containers: Option<Vec<ContainerSummary>>,
        pub logs: Option<Result<String, DockerAdapterError>>,
        pub inspect: Option<Result<InspectDetail, DockerAdapterError>>,
        pub stats: Option<Result<StatsSample, DockerAdapterError>>,
        pub exec: Option<Result<ExecOutcome, DockerAdapterError>>,
        pub read_file: Option<Result<String, DockerAdapterError>>,
        pub list_files: Option<Result<Vec<String>, DockerAdapterError>>,
    }

    #[async_trait]
    impl DockerAdapter for FakeDocker {
        async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockerAdapterError> {
            Ok(self
                .list_containers
                .clone()
                .expect("test did not configure list_containers"))
        }
        async fn logs(&self, _container: &str, _query: LogQuery) -> Result<String, DockerAdapterError> {
            clone_result(self.logs.as_ref().expect("test did not configure logs"))
        }
        async fn inspect(&self, _container: &str) -> Result<InspectDetail, DockerAdapterError> {
            clone_result(self.inspect.as_ref().expect("test did not configure inspect"))
        }
        async fn stats(&self, _container: &str, _timeout: Duration) -> Result<StatsSample, DockerAdapterError> {
            clone_result(self.stats.as_ref().expect("test did not configure stats"))
        }
        async fn exec(
            &self,
            _container: &str,
            _command: &[String],
            _timeout: Duration,
        ) -> Result<ExecOutcome, DockerAdapterError> {
            clone_result(self.exec.as_ref().expect("test did not configure exec"))
        }
        async fn read_file(
            &self,
            _container: &str,
            _path: &str,
            _max_lines: u32,
            _timeout: Duration,
        ) -> Result<String, DockerAdapterError> {
            clone_result(self.read_file.as_ref().expect("test did not configure read_file"))
        }
        async fn list_files(
            &self,
            _container: &str,
            _path: &str,
            _timeout: Duration,
        ) -> Result<Vec<String>, DockerAdapterError> {
            clone_result(self.list_files.as_ref().expect("test did not configure list_files"))
        }
    }

    fn clone_result<T: Clone>(r: &Result<T, DockerAdapterError>) -> Result<T, DockerAdapterError> {
        match r {
            Ok(v) => Ok(v.clone()),
            Err(err) => Err(clone_err(err)),
        }
    }

    fn clone_err(err: &DockerAdapterError) -> DockerAdapterError {
        match err {
            DockerAdapterError::NotFound(s) => DockerAdapterError::NotFound(s.clone()),
            DockerAdapterError::PermissionDenied(s) => DockerAdapterError::PermissionDenied(s.clone()),
            DockerAdapterError::Transport(s) => DockerAdapterError::Transport(s.clone()),
            DockerAdapterError::Timeout(d) => DockerAdapterError::Timeout(*d),
        }
    }

    /// A policy permissive enough that most handler tests only need to
    /// override the one field they care about.
    pub fn permissive_policy() -> SecurityPolicy {
        let mut policy = SecurityPolicy::default();
        policy.allowed_containers = vec!["*".to_string()];
        policy.permissions = crate::domain::policy::Permissions {
            logs: true,
            inspect: true,
            stats: true,
            exec: true,
            files: true,
        };
        policy
    }

    pub struct Fixture {
        pub policy_engine: PolicyEngine,
        pub masker: Masker,
        pub docker: FakeDocker,
        pub audit: NullAuditSink,
    }

    impl Fixture {
        pub fn new(policy: SecurityPolicy, docker: FakeDocker) -> Self {
            let masker = Masker::new(&policy).expect("test policy has valid masking patterns");
            Self {
                policy_engine: PolicyEngine::new(Arc::new(policy)),
                masker,
                docker,
                audit: NullAuditSink,
            }
        }

        pub fn ctx(&self) -> HandlerContext<'_> {
            HandlerContext {
                policy_engine: &self.policy_engine,
                masker: &self.masker,
                docker: &self.docker,
                audit: &self.audit,
                session_id: SessionId::new(),
                exec_timeout: Duration::from_secs(30),
                stats_timeout: Duration::from_secs(5),
            }
        }
    }
}
