// SPDX-License-Identifier: MIT
//! The wire transport (spec.md §3, §4.4): `GET /sse` for the server→client
//! stream, `POST /message?sessionId=...` for client→server requests,
//! `GET /health` for liveness probes.

mod http;
mod sse;

use std::sync::Arc;

use axum::Router;

use crate::application::session_manager::SessionManager;

pub struct AppState {
    pub session_manager: Arc<SessionManager>,
}

pub fn router(state: Arc<AppState>) -> Router {
    http::router(state)
}
