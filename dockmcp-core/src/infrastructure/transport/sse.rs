// SPDX-License-Identifier: MIT
//! `GET /sse`: opens a session and streams its outbound JSON-RPC responses
//! (spec.md §3, §4.4). Closing the stream — client disconnect, proxy
//! timeout, or server shutdown — tears the session down and records
//! `client_disconnect`.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::application::session_manager::SessionManager;
use crate::domain::session::SessionId;

use super::AppState;

/// SSE keep-alive cadence (SPEC_FULL §11): frequent enough that
/// intermediate proxies never see the connection go idle.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub(super) async fn sse_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let opened = state.session_manager.open_session(user_agent.clone());
    info!(session_id = %opened.id, user_agent = user_agent.as_deref().unwrap_or("-"), "session opened");

    // Mandatory first message: tells the client where to POST requests for
    // this session (spec.md §4.4, §6).
    let endpoint_event = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={}", opened.id));

    let rest = SessionEventStream {
        inner: ReceiverStream::new(opened.outbound_rx),
        session_id: opened.id,
        manager: state.session_manager.clone(),
    };

    let stream = futures::stream::iter(std::iter::once(Ok(endpoint_event))).chain(rest);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// Forwards to the session's bounded outbound channel; on drop (the
/// client went away) it schedules the session's removal from the table.
/// `Drop` cannot `.await`, so the actual teardown runs on a detached task.
struct SessionEventStream {
    inner: ReceiverStream<String>,
    session_id: SessionId,
    manager: Arc<SessionManager>,
}

impl Stream for SessionEventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|opt| opt.map(|line| Ok(Event::default().data(line))))
    }
}

impl Drop for SessionEventStream {
    fn drop(&mut self) {
        let manager = self.manager.clone();
        let session_id = self.session_id;
        tokio::spawn(async move {
            manager.close_session(session_id).await;
        });
    }
}
