// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events streaming for POST /v1/projects/{project_id}/runs/stream.
//!
//! Validation, model and credit errors are answered as ordinary JSON error
//! responses. Once the run is debited the response switches to
//! `text/event-stream`, one `data:` line per event:
//!
//! ```text
//! data: {"type":"chunk","content":"partial "}
//!
//! data: {"type":"complete","run":{...}}
//! ```
//!
//! A provider failure ends the stream with `{"type":"error","message":...}`.
//! If the client disconnects, the run is stopped with the output it had.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wadi_core::AuthIdentity;
use wadi_orchestrator::{RunEvent, RunRequest};

use crate::error::ApiError;
use crate::handlers::RunBody;
use crate::server::GatewayState;

/// Buffered events between the run driver and the HTTP body.
const EVENT_BUFFER: usize = 32;

/// Encode one run event as an SSE `data:` frame.
pub fn to_sse_event(event: &RunEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(json) => Event::default().data(json),
        Err(e) => Event::default().data(
            serde_json::json!({"type": "error", "message": format!("encoding error: {e}")})
                .to_string(),
        ),
    }
}

fn event_stream(rx: mpsc::Receiver<RunEvent>) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|event| (Ok(to_sse_event(&event)), rx))
    })
}

/// POST /v1/projects/{project_id}/runs/stream
pub async fn stream_run(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
    Json(body): Json<RunBody>,
) -> Response {
    let model = body.model.clone();
    let request = RunRequest {
        user_id: identity.user_id,
        project_id,
        input: body.input,
        model: body.model,
    };

    let streaming = match state.orchestrator.start_stream(request).await {
        Ok(streaming) => streaming,
        Err(e) => return ApiError::with_model(e, model).into_response(),
    };

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let run_id = streaming.run().id.clone();
        if let Err(e) = orchestrator
            .drive_stream(streaming, tx, CancellationToken::new())
            .await
        {
            tracing::debug!(run_id = %run_id, error = %e, "sse run ended with error");
        }
    });

    Sse::new(event_stream(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}
