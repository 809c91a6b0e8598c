// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming run lifecycle.
//!
//! A streaming run is debited and inserted as `pending` by
//! [`RunOrchestrator::start_stream`]. [`RunOrchestrator::drive_stream`]
//! then forwards each provider chunk to the transport and moves the run to
//! exactly one terminal status:
//!
//! - `complete`: the provider stream ended normally
//! - `stopped`: the cancellation token fired or the receiver went away;
//!   the output accumulated so far is kept and nothing is refunded
//! - `failed`: the provider errored; the output is discarded and the
//!   debit is refunded

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wadi_core::{ChatMessage, ProviderRequest, Run, RunStatus, WadiError};
use wadi_storage::queries::runs;

use crate::orchestrator::{Billing, RunOrchestrator};
use crate::request::RunRequest;

/// Event forwarded to a streaming transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunEvent {
    Chunk { content: String },
    Complete { run: Run },
    Error { message: String, code: &'static str },
}

/// How a driven stream ended without a provider error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed(Run),
    Stopped(Run),
}

impl StreamOutcome {
    pub fn run(&self) -> &Run {
        match self {
            StreamOutcome::Completed(run) | StreamOutcome::Stopped(run) => run,
        }
    }
}

/// A debited, pending run waiting to be driven.
pub struct StreamingRun {
    request: RunRequest,
    run: Run,
    messages: Vec<ChatMessage>,
    billing: Billing,
}

impl StreamingRun {
    /// The pending run record.
    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn credits_used(&self) -> i64 {
        self.billing.cost
    }

    pub fn credits_remaining(&self) -> i64 {
        self.billing.credits_remaining
    }
}

enum Step {
    Cancelled,
    Next(Option<Result<String, WadiError>>),
}

impl RunOrchestrator {
    /// Validate, debit and insert a `pending` run.
    ///
    /// Errors returned here happen before any event is produced, so
    /// transports can answer them as ordinary error responses.
    pub async fn start_stream(&self, request: RunRequest) -> Result<StreamingRun, WadiError> {
        let billing = self.validate_and_debit(&request).await?;

        let run = runs::new_run(
            &request.user_id,
            &request.project_id,
            &request.input,
            &request.model,
            Some(billing.session.id.clone()),
            RunStatus::Pending,
        );
        if let Err(e) = runs::insert_run(&self.db, &run).await {
            self.refund(&request, billing.cost, Some(&run.id), &e).await;
            return Err(e);
        }

        let messages = self.build_messages(&request).await;
        debug!(run_id = %run.id, user_id = %run.user_id, "streaming run started");

        Ok(StreamingRun {
            request,
            run,
            messages,
            billing,
        })
    }

    /// Forward provider chunks to `events` until the stream ends, fails,
    /// or `cancel` fires.
    ///
    /// Cancellation is checked between chunks. Returning drops the provider
    /// stream, which closes the upstream response.
    pub async fn drive_stream(
        &self,
        streaming: StreamingRun,
        events: mpsc::Sender<RunEvent>,
        cancel: CancellationToken,
    ) -> Result<StreamOutcome, WadiError> {
        let provider_request = ProviderRequest {
            model: streaming.request.model.clone(),
            messages: streaming.messages.clone(),
            max_tokens: self.options.max_tokens,
        };

        let mut stream = match self.provider.complete_stream(provider_request).await {
            Ok(stream) => stream,
            Err(e) => return self.fail_stream(streaming, &events, e).await,
        };

        let mut output = String::new();
        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Cancelled,
                next = stream.next() => Step::Next(next),
            };

            match step {
                Step::Cancelled => {
                    drop(stream);
                    return self.stop_stream(streaming, output).await;
                }
                Step::Next(None) => break,
                Step::Next(Some(Ok(chunk))) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    output.push_str(&chunk);
                    wadi_prometheus::record_chunk();
                    if events.send(RunEvent::Chunk { content: chunk }).await.is_err() {
                        debug!(run_id = %streaming.run.id, "event receiver closed; stopping run");
                        drop(stream);
                        return self.stop_stream(streaming, output).await;
                    }
                }
                Step::Next(Some(Err(e))) => {
                    drop(stream);
                    return self.fail_stream(streaming, &events, e).await;
                }
            }
        }
        drop(stream);

        if let Err(e) =
            runs::finalize_run(&self.db, &streaming.run.id, RunStatus::Complete, &output).await
        {
            error!(run_id = %streaming.run.id, error = %e, "failed to persist streamed run");
            return self.fail_stream(streaming, &events, e).await;
        }

        let mut run = streaming.run;
        run.status = RunStatus::Complete;
        run.output = output;

        info!(
            run_id = %run.id,
            user_id = %run.user_id,
            project_id = %run.project_id,
            credits_used = streaming.billing.cost,
            "streamed run completed"
        );
        wadi_prometheus::record_run(
            "stream",
            "complete",
            streaming.billing.started.elapsed().as_secs_f64(),
        );

        let _ = events.send(RunEvent::Complete { run: run.clone() }).await;
        self.record_memory(&run).await;
        Ok(StreamOutcome::Completed(run))
    }

    async fn stop_stream(
        &self,
        streaming: StreamingRun,
        output: String,
    ) -> Result<StreamOutcome, WadiError> {
        if let Err(e) =
            runs::finalize_run(&self.db, &streaming.run.id, RunStatus::Stopped, &output).await
        {
            error!(run_id = %streaming.run.id, error = %e, "failed to persist stopped run");
        }

        let mut run = streaming.run;
        run.status = RunStatus::Stopped;
        run.output = output;

        info!(run_id = %run.id, chars = run.output.len(), "streamed run stopped");
        wadi_prometheus::record_run(
            "stream",
            "stopped",
            streaming.billing.started.elapsed().as_secs_f64(),
        );
        Ok(StreamOutcome::Stopped(run))
    }

    async fn fail_stream(
        &self,
        streaming: StreamingRun,
        events: &mpsc::Sender<RunEvent>,
        cause: WadiError,
    ) -> Result<StreamOutcome, WadiError> {
        warn!(run_id = %streaming.run.id, error = %cause, "streamed run failed");

        if let Err(e) =
            runs::finalize_run(&self.db, &streaming.run.id, RunStatus::Failed, "").await
        {
            error!(run_id = %streaming.run.id, error = %e, "failed to mark run as failed");
        }
        self.refund(
            &streaming.request,
            streaming.billing.cost,
            Some(&streaming.run.id),
            &cause,
        )
        .await;
        wadi_prometheus::record_run(
            "stream",
            "failed",
            streaming.billing.started.elapsed().as_secs_f64(),
        );

        let _ = events
            .send(RunEvent::Error {
                message: cause.to_string(),
                code: cause.code(),
            })
            .await;
        Err(cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let chunk = serde_json::to_value(RunEvent::Chunk {
            content: "hi".into(),
        })
        .unwrap();
        assert_eq!(chunk, serde_json::json!({"type": "chunk", "content": "hi"}));

        let err = serde_json::to_value(RunEvent::Error {
            message: "boom".into(),
            code: "AI_GENERATION_ERROR",
        })
        .unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["message"], "boom");
    }
}
