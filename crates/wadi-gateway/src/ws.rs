// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for streamed runs.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "auth", "token": "..."}
//! {"type": "run", "projectId": "p1", "input": "hello", "model": "gpt-4o", "requestId": "r1"}
//! {"type": "stop", "requestId": "r1"}
//! {"type": "ping"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "authenticated", "userId": "alice"}
//! {"type": "status", "status": "started", "requestId": "r1"}
//! {"type": "chunk", "content": "partial...", "requestId": "r1"}
//! {"type": "complete", "run": {...}, "requestId": "r1"}
//! {"type": "error", "error": "...", "code": "...", "requestId": "r1"}
//! {"type": "pong"}
//! ```
//!
//! A connection must send `auth` within the auth timeout or it is closed.
//! Messages other than `auth` and `ping` are rejected until then. The
//! server sends a WebSocket ping frame every heartbeat interval; missing
//! pongs do not close the connection.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use dashmap::DashMap;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wadi_core::{AuthToken, Run};
use wadi_orchestrator::{RunEvent, RunOrchestrator, RunRequest, StreamOutcome};

use crate::registry::ConnectionInfo;
use crate::server::GatewayState;

/// Outbound messages buffered per connection.
const OUTBOUND_BUFFER: usize = 64;
/// Run events buffered between the driver and the connection.
const EVENT_BUFFER: usize = 32;
/// Time allowed to flush queued messages after the client goes away.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Message from client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Auth {
        token: String,
    },
    Run {
        #[serde(rename = "projectId")]
        project_id: String,
        input: String,
        model: String,
        #[serde(rename = "requestId")]
        request_id: String,
    },
    Stop {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    Ping,
}

/// Message to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Authenticated {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Status {
        status: String,
        #[serde(rename = "requestId")]
        request_id: String,
    },
    Chunk {
        content: String,
        #[serde(rename = "requestId")]
        request_id: String,
    },
    Complete {
        run: Run,
        #[serde(rename = "requestId")]
        request_id: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    Pong,
}

impl ServerMessage {
    fn error(error: impl Into<String>, code: &str, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            error: error.into(),
            code: Some(code.to_string()),
            request_id,
        }
    }
}

/// Per-connection state owned by the read loop.
struct Connection {
    id: String,
    user_id: Option<String>,
    /// requestId -> cancellation for runs in flight on this connection.
    in_flight: Arc<DashMap<String, CancellationToken>>,
    out: mpsc::Sender<ServerMessage>,
}

impl Connection {
    async fn send(&self, message: ServerMessage) {
        // A closed channel means the writer is gone; the read loop ends soon after.
        let _ = self.out.send(message).await;
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
///
/// A writer task owns the socket sink and multiplexes outgoing messages
/// with heartbeat pings. The read loop here parses client messages and
/// spawns one task per run.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);
    let mut writer = tokio::spawn(write_loop(ws_sender, out_rx, state.ws.heartbeat_interval));

    let mut conn = Connection {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: None,
        in_flight: Arc::new(DashMap::new()),
        out: out_tx,
    };
    wadi_prometheus::connection_opened();
    tracing::debug!(connection_id = %conn.id, "socket connected");

    let auth_deadline = Instant::now() + state.ws.auth_timeout;
    loop {
        let next = if conn.user_id.is_none() {
            match tokio::time::timeout_at(auth_deadline, ws_receiver.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::debug!(connection_id = %conn.id, "socket auth timeout");
                    conn.send(ServerMessage::error(
                        "authentication timeout",
                        "UNAUTHORIZED",
                        None,
                    ))
                    .await;
                    break;
                }
            }
        } else {
            ws_receiver.next().await
        };

        let Some(Ok(message)) = next else {
            break;
        };
        match message {
            Message::Text(text) => handle_text(&state, &mut conn, text.as_str()).await,
            Message::Close(_) => break,
            _ => {} // Binary ignored; ping/pong handled by the protocol layer.
        }
    }

    for entry in conn.in_flight.iter() {
        entry.value().cancel();
    }
    if conn.user_id.is_some() {
        state.registry.unregister(&conn.id).await;
    }
    wadi_prometheus::connection_closed();
    tracing::debug!(connection_id = %conn.id, "socket disconnected");

    // Run tasks hold their own senders; the writer drains until they finish.
    drop(conn);
    if tokio::time::timeout(FLUSH_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerMessage>,
    heartbeat: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else {
                    break;
                };
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode socket message");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }
            _ = ticker.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    return;
                }
            }
        }
    }
    let _ = sink.send(Message::Close(None)).await;
}

async fn handle_text(state: &GatewayState, conn: &mut Connection, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(connection_id = %conn.id, "invalid socket message: {e}");
            conn.send(ServerMessage::error(
                format!("invalid message: {e}"),
                "INVALID_INPUT",
                None,
            ))
            .await;
            return;
        }
    };

    match message {
        ClientMessage::Ping => conn.send(ServerMessage::Pong).await,
        ClientMessage::Auth { token } => authenticate(state, conn, token).await,
        ClientMessage::Run {
            project_id,
            input,
            model,
            request_id,
        } => {
            let Some(user_id) = conn.user_id.clone() else {
                conn.send(ServerMessage::error(
                    "not authenticated",
                    "UNAUTHORIZED",
                    Some(request_id),
                ))
                .await;
                return;
            };
            if request_id.is_empty() {
                conn.send(ServerMessage::error(
                    "requestId must not be empty",
                    "INVALID_INPUT",
                    None,
                ))
                .await;
                return;
            }
            if conn.in_flight.contains_key(&request_id) {
                conn.send(ServerMessage::error(
                    "requestId already in use",
                    "INVALID_INPUT",
                    Some(request_id),
                ))
                .await;
                return;
            }

            let cancel = CancellationToken::new();
            conn.in_flight.insert(request_id.clone(), cancel.clone());
            let request = RunRequest {
                user_id,
                project_id,
                input,
                model,
            };
            tokio::spawn(run_task(
                state.orchestrator.clone(),
                request,
                request_id,
                cancel,
                conn.out.clone(),
                conn.in_flight.clone(),
            ));
        }
        ClientMessage::Stop { request_id } => {
            if conn.user_id.is_none() {
                conn.send(ServerMessage::error(
                    "not authenticated",
                    "UNAUTHORIZED",
                    Some(request_id),
                ))
                .await;
                return;
            }
            let cancelled = match conn.in_flight.get(&request_id) {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            };
            if !cancelled {
                conn.send(ServerMessage::error(
                    "no active run for requestId",
                    "NOT_FOUND",
                    Some(request_id),
                ))
                .await;
            }
        }
    }
}

async fn authenticate(state: &GatewayState, conn: &mut Connection, token: String) {
    if conn.user_id.is_some() {
        conn.send(ServerMessage::error(
            "already authenticated",
            "INVALID_INPUT",
            None,
        ))
        .await;
        return;
    }
    match state.auth.authenticate(AuthToken(token)).await {
        Ok(identity) => {
            state
                .registry
                .register(ConnectionInfo {
                    id: conn.id.clone(),
                    user_id: identity.user_id.clone(),
                    connected_at: wadi_storage::now_timestamp(),
                })
                .await;
            tracing::info!(
                connection_id = %conn.id,
                user_id = %identity.user_id,
                "socket authenticated"
            );
            conn.user_id = Some(identity.user_id.clone());
            conn.send(ServerMessage::Authenticated {
                user_id: identity.user_id,
            })
            .await;
        }
        Err(_) => {
            conn.send(ServerMessage::error("invalid token", "UNAUTHORIZED", None))
                .await;
        }
    }
}

/// Drive one run and translate its events into socket messages.
///
/// Chunks that arrive after a stop are dropped rather than forwarded.
async fn run_task(
    orchestrator: RunOrchestrator,
    request: RunRequest,
    request_id: String,
    cancel: CancellationToken,
    out: mpsc::Sender<ServerMessage>,
    in_flight: Arc<DashMap<String, CancellationToken>>,
) {
    let last = match orchestrator.start_stream(request).await {
        Err(e) => Some(ServerMessage::error(
            e.to_string(),
            e.code(),
            Some(request_id.clone()),
        )),
        Ok(streaming) => {
            let _ = out
                .send(ServerMessage::Status {
                    status: "started".into(),
                    request_id: request_id.clone(),
                })
                .await;

            let (tx, rx) = mpsc::channel(EVENT_BUFFER);
            let forward = async {
                // Owned here so the driver sees a closed channel if the writer goes away.
                let mut rx = rx;
                let mut terminal_sent = false;
                while let Some(event) = rx.recv().await {
                    terminal_sent |= !matches!(event, RunEvent::Chunk { .. });
                    let message = match event {
                        RunEvent::Chunk { content } => {
                            if cancel.is_cancelled() {
                                continue;
                            }
                            ServerMessage::Chunk {
                                content,
                                request_id: request_id.clone(),
                            }
                        }
                        RunEvent::Complete { run } => ServerMessage::Complete {
                            run,
                            request_id: request_id.clone(),
                        },
                        RunEvent::Error { message, code } => {
                            ServerMessage::error(message, code, Some(request_id.clone()))
                        }
                    };
                    if out.send(message).await.is_err() {
                        break;
                    }
                }
                terminal_sent
            };

            let (outcome, terminal_sent) = tokio::join!(
                orchestrator.drive_stream(streaming, tx, cancel.clone()),
                forward
            );

            match outcome {
                Ok(StreamOutcome::Stopped(_)) => Some(ServerMessage::Status {
                    status: "stopped".into(),
                    request_id: request_id.clone(),
                }),
                Err(e) if !terminal_sent => {
                    tracing::warn!(request_id = %request_id, error = %e, "run ended without a final event");
                    Some(ServerMessage::error(
                        e.to_string(),
                        e.code(),
                        Some(request_id.clone()),
                    ))
                }
                _ => None,
            }
        }
    };

    // Free the requestId before the final message so the client may reuse it.
    in_flight.remove(&request_id);
    if let Some(message) = last {
        let _ = out.send(message).await;
    }
}
