// SPDX-License-Identifier: MIT
//! `POST /message` and `GET /health` (spec.md §4.4). The SSE side lives in
//! [`super::sse`].

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::domain::mcp::JsonRpcRequest;
use crate::domain::session::SessionId;

use super::sse::sse_handler;
use super::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route("/message", post(message_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Decodes the body, validates the session, and enqueues the request onto
/// the session's dispatcher. The actual JSON-RPC response is delivered
/// asynchronously over `/sse` — this endpoint only ever answers 202 or an
/// error describing why the request could not be queued.
async fn message_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let session_id: SessionId = match query.session_id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid sessionId").into_response(),
    };

    if !state.session_manager.session_exists(session_id) {
        return (StatusCode::BAD_REQUEST, "unknown sessionId").into_response();
    }

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!(%session_id, error = %err, "rejecting malformed JSON-RPC body");
            return (StatusCode::BAD_REQUEST, "malformed JSON-RPC body").into_response();
        }
    };

    match state.session_manager.enqueue(session_id, request) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "accepted"})),
        )
            .into_response(),
        Err(err) => {
            warn!(%session_id, error = %err, "failed to enqueue request");
            (StatusCode::BAD_REQUEST, "session is no longer accepting requests").into_response()
        }
    }
}
