// SPDX-License-Identifier: MIT
//! Audit event domain model (spec.md §3, §6 "Logs/metrics").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ToolCall,
    AccessDenied,
    ClientConnect,
    ClientDisconnect,
    SecurityPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Denied,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub event_type: AuditEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub result: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn tool_call(
        session_id: SessionId,
        tool: impl Into<String>,
        container: Option<String>,
        result: AuditResult,
        duration_ms: u64,
        error_message: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            event_type: AuditEventType::ToolCall,
            timestamp: Utc::now(),
            tool: Some(tool.into()),
            container,
            result,
            client_name: None,
            session_id: Some(session_id),
            duration_ms,
            error_message,
            details,
        }
    }

    pub fn access_denied(
        session_id: SessionId,
        tool: impl Into<String>,
        container: Option<String>,
        reason: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            event_type: AuditEventType::AccessDenied,
            timestamp: Utc::now(),
            tool: Some(tool.into()),
            container,
            result: AuditResult::Denied,
            client_name: None,
            session_id: Some(session_id),
            duration_ms: 0,
            error_message: Some(reason.into()),
            details,
        }
    }

    pub fn client_connect(session_id: SessionId, user_agent: Option<String>) -> Self {
        Self {
            event_type: AuditEventType::ClientConnect,
            timestamp: Utc::now(),
            tool: None,
            container: None,
            result: AuditResult::Success,
            client_name: user_agent,
            session_id: Some(session_id),
            duration_ms: 0,
            error_message: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn client_disconnect(session_id: SessionId, client_name: Option<String>) -> Self {
        Self {
            event_type: AuditEventType::ClientDisconnect,
            timestamp: Utc::now(),
            tool: None,
            container: None,
            result: AuditResult::Success,
            client_name,
            session_id: Some(session_id),
            duration_ms: 0,
            error_message: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn security_policy(details: serde_json::Value) -> Self {
        Self {
            event_type: AuditEventType::SecurityPolicy,
            timestamp: Utc::now(),
            tool: None,
            container: None,
            result: AuditResult::Success,
            client_name: None,
            session_id: None,
            duration_ms: 0,
            error_message: None,
            details,
        }
    }
}

/// Port consumed by every component that produces audit events. Callers
/// treat it as fire-and-forget; implementations serialise writes
/// internally (spec.md §5).
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// No-op sink, useful for tests and for `audit.enabled: false`.
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
