// SPDX-License-Identifier: MIT
//! Session table and per-session dispatch routine (spec.md §4.4, §5).
//!
//! Each session owns one cooperative dispatcher task pulling from an
//! unbounded inbound queue — this preserves per-session response ordering
//! (one request in flight at a time) while letting sessions progress
//! independently of each other. The session table itself is a concurrent
//! map (`dashmap`): lookups never block writers, removal is single-writer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info_span};

use crate::application::masker::Masker;
use crate::application::policy_engine::PolicyEngine;
use crate::application::tool_handlers::{self, HandlerContext, TOOL_NAMES};
use crate::domain::audit::{AuditEvent, AuditSink};
use crate::domain::docker::DockerAdapter;
use crate::domain::mcp::{JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use crate::domain::session::{ClientInfo, Session, SessionId};
use crate::infrastructure::request_counter::RequestCounter;

/// The outbound channel is bounded (spec.md §5, "≈10 messages"): a
/// producer that finds it full blocks until the SSE writer drains,
/// applying backpressure to exactly that session.
const OUTBOUND_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub enum SessionLookupError {
    #[error("unknown session")]
    NotFound,
    #[error("session is no longer accepting requests")]
    Closed,
}

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    inbound_tx: mpsc::UnboundedSender<JsonRpcRequest>,
    _dispatcher: JoinHandle<()>,
}

pub struct OpenedSession {
    pub id: SessionId,
    pub outbound_rx: mpsc::Receiver<String>,
}

pub struct SessionManager {
    sessions: DashMap<SessionId, SessionEntry>,
    policy_engine: Arc<PolicyEngine>,
    masker: Arc<Masker>,
    docker: Arc<dyn DockerAdapter>,
    audit: Arc<dyn AuditSink>,
    request_counter: Arc<RequestCounter>,
    exec_timeout: Duration,
    stats_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        policy_engine: Arc<PolicyEngine>,
        masker: Arc<Masker>,
        docker: Arc<dyn DockerAdapter>,
        audit: Arc<dyn AuditSink>,
        exec_timeout: Duration,
        stats_timeout: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            policy_engine,
            masker,
            docker,
            audit,
            request_counter: Arc::new(RequestCounter::new()),
            exec_timeout,
            stats_timeout,
        }
    }

    /// Creates a new session, records `client_connect`, and spawns its
    /// dispatcher task. Returns the outbound receiver half for the SSE
    /// writer to drain.
    pub fn open_session(&self, user_agent: Option<String>) -> OpenedSession {
        let session = Session::new(user_agent.clone());
        let id = session.id;
        let session = Arc::new(Mutex::new(session));

        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<JsonRpcRequest>();

        let policy_engine = self.policy_engine.clone();
        let masker = self.masker.clone();
        let docker = self.docker.clone();
        let audit = self.audit.clone();
        let request_counter = self.request_counter.clone();
        let exec_timeout = self.exec_timeout;
        let stats_timeout = self.stats_timeout;
        let dispatcher_session = session.clone();

        let dispatcher = tokio::spawn(async move {
            while let Some(request) = inbound_rx.recv().await {
                let n = request_counter.next();
                let _span = info_span!("request", n).entered();
                process_request(
                    &dispatcher_session,
                    id,
                    request,
                    &policy_engine,
                    &masker,
                    docker.as_ref(),
                    audit.as_ref(),
                    exec_timeout,
                    stats_timeout,
                    &outbound_tx,
                )
                .await;
            }
        });

        self.audit.record(AuditEvent::client_connect(id, user_agent));

        self.sessions.insert(
            id,
            SessionEntry {
                session,
                inbound_tx,
                _dispatcher: dispatcher,
            },
        );

        OpenedSession { id, outbound_rx }
    }

    pub fn enqueue(
        &self,
        session_id: SessionId,
        request: JsonRpcRequest,
    ) -> Result<(), SessionLookupError> {
        let entry = self
            .sessions
            .get(&session_id)
            .ok_or(SessionLookupError::NotFound)?;
        entry
            .inbound_tx
            .send(request)
            .map_err(|_| SessionLookupError::Closed)
    }

    pub fn session_exists(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Removes the session and records `client_disconnect`. Dropping the
    /// entry drops `inbound_tx`, which ends the dispatcher loop.
    pub async fn close_session(&self, session_id: SessionId) {
        if let Some((_, entry)) = self.sessions.remove(&session_id) {
            let mut guard = entry.session.lock().await;
            let client_name = guard
                .client_info
                .as_ref()
                .map(|c| c.name.clone())
                .or_else(|| guard.user_agent.clone());
            guard.close();
            drop(guard);
            self.audit
                .record(AuditEvent::client_disconnect(session_id, client_name));
        }
    }

    /// Snapshot summary of sessions that never sent `initialize`, grouped
    /// by user agent (spec.md §4.4 "graceful shutdown").
    pub fn uninitialized_probe_summary(&self) -> String {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in self.sessions.iter() {
            if let Ok(session) = entry.session.try_lock() {
                if session.is_probe() {
                    let ua = session
                        .user_agent
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string());
                    *counts.entry(ua).or_insert(0) += 1;
                }
            }
        }
        counts
            .into_iter()
            .map(|(ua, n)| format!("{ua}: {n}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }
}

#[allow(clippy::too_many_arguments)]
async fn process_request(
    session: &Arc<Mutex<Session>>,
    session_id: SessionId,
    request: JsonRpcRequest,
    policy_engine: &Arc<PolicyEngine>,
    masker: &Arc<Masker>,
    docker: &dyn DockerAdapter,
    audit: &dyn AuditSink,
    exec_timeout: Duration,
    stats_timeout: Duration,
    outbound_tx: &mpsc::Sender<String>,
) {
    if request.is_notification() {
        if request.method == "notifications/initialized" {
            debug!(%session_id, "client acknowledged initialization");
        } else {
            debug!(%session_id, method = %request.method, "ignoring unrecognised notification");
        }
        return;
    }

    let id = request.id.clone().unwrap_or(serde_json::Value::Null);

    match request.method.as_str() {
        "initialize" => {
            let client_info = request
                .params
                .as_ref()
                .and_then(|p| p.get("clientInfo"))
                .and_then(|ci| serde_json::from_value::<ClientInfo>(ci.clone()).ok())
                .unwrap_or(ClientInfo {
                    name: "unknown".to_string(),
                    version: "0".to_string(),
                });

            let mut guard = session.lock().await;
            let outcome = guard.initialize(client_info);
            drop(guard);

            let response = match outcome {
                Ok(()) => JsonRpcResponse::success(
                    id,
                    serde_json::json!({
                        "status": "ok",
                        "capabilities": {"tools": {"listChanged": false}},
                        "serverInfo": {"name": "dockmcp", "version": env!("CARGO_PKG_VERSION")},
                    }),
                ),
                Err(err) => JsonRpcResponse::error(
                    id,
                    JsonRpcErrorCode::InvalidRequest.into_error(err.to_string()),
                ),
            };
            send(outbound_tx, &response).await;
        }
        "tools/list" => {
            let tools: Vec<_> = TOOL_NAMES
                .iter()
                .map(|name| serde_json::json!({"name": name}))
                .collect();
            let response = JsonRpcResponse::success(id, serde_json::json!({"tools": tools}));
            send(outbound_tx, &response).await;
        }
        "tools/call" => {
            let initialized = session.lock().await.is_initialized();
            if !initialized {
                let response = JsonRpcResponse::error(
                    id,
                    JsonRpcErrorCode::InvalidRequest
                        .into_error("tools/call is not permitted before initialize"),
                );
                send(outbound_tx, &response).await;
                return;
            }

            let params: ToolCallParams = match request
                .params
                .clone()
                .and_then(|p| serde_json::from_value(p).ok())
            {
                Some(params) => params,
                None => {
                    let response = JsonRpcResponse::error(
                        id,
                        JsonRpcErrorCode::InvalidParams
                            .into_error("tools/call requires params.name"),
                    );
                    send(outbound_tx, &response).await;
                    return;
                }
            };

            let ctx = HandlerContext {
                policy_engine,
                masker,
                docker,
                audit,
                session_id,
                exec_timeout,
                stats_timeout,
            };

            let response = match tool_handlers::dispatch(&ctx, &params.name, params.arguments).await
            {
                Ok(result) => JsonRpcResponse::success(
                    id,
                    serde_json::to_value(result).unwrap_or(serde_json::Value::Null),
                ),
                Err(err) => JsonRpcResponse::error(id, err),
            };
            send(outbound_tx, &response).await;
        }
        other => {
            let response = JsonRpcResponse::error(
                id,
                JsonRpcErrorCode::MethodNotFound.into_error(format!("unknown method `{other}`")),
            );
            send(outbound_tx, &response).await;
        }
    }
}

async fn send(outbound_tx: &mpsc::Sender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(line) => {
            let _ = outbound_tx.send(line).await;
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize JSON-RPC response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::docker::{ContainerSummary, DockerAdapterError, ExecOutcome, InspectDetail, LogQuery, StatsSample};
    use crate::domain::policy::SecurityPolicy;

    struct StubDocker;

    #[async_trait::async_trait]
    impl DockerAdapter for StubDocker {
        async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockerAdapterError> {
            Ok(vec![])
        }
        async fn logs(&self, _c: &str, _q: LogQuery) -> Result<String, DockerAdapterError> {
            Ok(String::new())
        }
        async fn inspect(&self, _c: &str) -> Result<InspectDetail, DockerAdapterError> {
            Ok(InspectDetail {
                raw_json: serde_json::Value::Null,
            })
        }
        async fn stats(
            &self,
            _c: &str,
            _t: Duration,
        ) -> Result<StatsSample, DockerAdapterError> {
            Ok(StatsSample::default())
        }
        async fn exec(
            &self,
            _c: &str,
            _cmd: &[String],
            _t: Duration,
        ) -> Result<ExecOutcome, DockerAdapterError> {
            Ok(ExecOutcome::default())
        }
        async fn read_file(
            &self,
            _c: &str,
            _p: &str,
            _m: u32,
            _t: Duration,
        ) -> Result<String, DockerAdapterError> {
            Ok(String::new())
        }
        async fn list_files(
            &self,
            _c: &str,
            _p: &str,
            _t: Duration,
        ) -> Result<Vec<String>, DockerAdapterError> {
            Ok(vec![])
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(PolicyEngine::new(Arc::new(SecurityPolicy::default()))),
            Arc::new(Masker::new(&SecurityPolicy::default()).unwrap()),
            Arc::new(StubDocker),
            Arc::new(crate::domain::audit::NullAuditSink),
            Duration::from_secs(30),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn tools_call_before_initialize_is_refused() {
        let mgr = manager();
        let opened = mgr.open_session(Some("curl/8.0".to_string()));

        mgr.enqueue(
            opened.id,
            JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Some(serde_json::json!(1)),
                method: "tools/call".to_string(),
                params: Some(serde_json::json!({"name": "list_containers", "arguments": {}})),
            },
        )
        .unwrap();

        let mut rx = opened.outbound_rx;
        let line = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn initialize_then_tools_call_succeeds() {
        let mgr = manager();
        let opened = mgr.open_session(None);
        let mut rx = opened.outbound_rx;

        mgr.enqueue(
            opened.id,
            JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Some(serde_json::json!(0)),
                method: "initialize".to_string(),
                params: Some(serde_json::json!({"clientInfo": {"name": "test", "version": "1"}})),
            },
        )
        .unwrap();
        let init_line = rx.recv().await.unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&init_line).unwrap()["result"]["status"]
            == "ok");

        mgr.enqueue(
            opened.id,
            JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Some(serde_json::json!(1)),
                method: "tools/call".to_string(),
                params: Some(serde_json::json!({"name": "list_containers", "arguments": {}})),
            },
        )
        .unwrap();
        let call_line = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&call_line).unwrap();
        assert!(value.get("error").is_none());
    }

    #[tokio::test]
    async fn uninitialized_sessions_are_counted_as_probes() {
        let mgr = manager();
        mgr.open_session(Some("claude-code/1.0".to_string()));
        mgr.open_session(Some("claude-code/1.0".to_string()));
        mgr.open_session(Some("curl/8.0".to_string()));

        let summary = mgr.uninitialized_probe_summary();
        assert!(summary.contains("claude-code/1.0: 2"));
        assert!(summary.contains("curl/8.0: 1"));
    }
}
