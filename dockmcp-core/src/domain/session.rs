// SPDX-License-Identifier: MIT
//! Session domain model (spec.md §3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Open,
    Initialized,
    Closing,
    Closed,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not open (currently {0:?})")]
    NotOpen(SessionState),
    #[error("session has not been initialized")]
    NotInitialized,
}

/// Per-session lifecycle state. Owns no I/O — the bounded outbound channel
/// and the actual SSE writer live in `application::session_manager`, which
/// pairs this aggregate with a `tokio::sync::mpsc::Sender`.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub client_info: Option<ClientInfo>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub initialized_at: Option<DateTime<Utc>>,
    pub user_agent: Option<String>,
}

impl Session {
    pub fn new(user_agent: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            client_info: None,
            state: SessionState::Open,
            created_at: Utc::now(),
            initialized_at: None,
            user_agent,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state == SessionState::Initialized
    }

    /// Records the handshake: only legal from `Open`.
    pub fn initialize(&mut self, client_info: ClientInfo) -> Result<(), SessionError> {
        if self.state != SessionState::Open {
            return Err(SessionError::NotOpen(self.state));
        }
        self.client_info = Some(client_info);
        self.state = SessionState::Initialized;
        self.initialized_at = Some(Utc::now());
        Ok(())
    }

    /// A session that never initialized counts as a "probe" at shutdown
    /// time (spec.md §4.4).
    pub fn is_probe(&self) -> bool {
        self.initialized_at.is_none()
    }

    pub fn begin_closing(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closing;
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
