// SPDX-License-Identifier: MIT
//! Audit sink implementations (spec.md §1 "audit log sinks... consumed,
//! not designed here" — but an in-tree default still has to exist).
//! Serializes every event as one JSON line; writes are appended under a
//! mutex so concurrent callers never interleave partial lines.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;

use crate::domain::audit::{AuditEvent, AuditEventType, AuditSink};
use crate::infrastructure::config::AuditEventsConfig;

/// Wraps an inner sink with the per-event-type enable/disable switches from
/// `audit.events` in config. Disabled event types are silently dropped.
pub struct FilteredAuditSink<S> {
    inner: S,
    events: AuditEventsConfig,
}

impl<S: AuditSink> FilteredAuditSink<S> {
    pub fn new(inner: S, events: AuditEventsConfig) -> Self {
        Self { inner, events }
    }

    fn enabled(&self, event_type: AuditEventType) -> bool {
        match event_type {
            AuditEventType::ToolCall => self.events.tool_calls,
            AuditEventType::AccessDenied => self.events.access_denied,
            AuditEventType::ClientConnect | AuditEventType::ClientDisconnect => {
                self.events.client_connections
            }
            AuditEventType::SecurityPolicy => self.events.security_policy,
        }
    }
}

impl<S: AuditSink> AuditSink for FilteredAuditSink<S> {
    fn record(&self, event: AuditEvent) {
        if self.enabled(event.event_type) {
            self.inner.record(event);
        }
    }
}

/// Appends one JSON line per event to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => eprintln!("{line}"),
            Err(err) => warn!(error = %err, "failed to serialize audit event"),
        }
    }
}

/// Appends one JSON line per event to a file, opened once at construction
/// and shared behind a mutex for the lifetime of the server.
pub struct FileAuditSink {
    file: Mutex<File>,
}

impl FileAuditSink {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: AuditEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to serialize audit event");
                return;
            }
        };
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(file, "{line}") {
            warn!(error = %err, "failed to write audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::AuditResult;
    use crate::domain::session::SessionId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);

    impl AuditSink for CountingSink {
        fn record(&self, _event: AuditEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn filtered_sink_drops_disabled_event_types() {
        let mut events = AuditEventsConfig {
            tool_calls: false,
            access_denied: true,
            client_connections: true,
            security_policy: true,
        };
        events.tool_calls = false;
        let counting = CountingSink(AtomicUsize::new(0));
        let sink = FilteredAuditSink::new(counting, events);

        sink.record(AuditEvent::tool_call(
            SessionId::new(),
            "get_logs",
            None,
            AuditResult::Success,
            10,
            None,
            serde_json::Value::Null,
        ));
        sink.record(AuditEvent::access_denied(
            SessionId::new(),
            "get_logs",
            None,
            "denied",
            serde_json::Value::Null,
        ));

        assert_eq!(sink.inner.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn file_sink_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileAuditSink::open(&path).unwrap();
        sink.record(AuditEvent::security_policy(serde_json::json!({"note": "loaded"})));
        sink.record(AuditEvent::security_policy(serde_json::json!({"note": "loaded again"})));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
