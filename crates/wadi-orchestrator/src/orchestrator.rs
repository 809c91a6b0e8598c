// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-streaming run lifecycle and shared orchestration helpers.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, info, warn};
use wadi_core::{ChatMessage, ProviderAdapter, ProviderRequest, Run, RunStatus, Session, WadiError};
use wadi_credits::{credit_cost, CreditLedger};
use wadi_memory::{MemoryService, NewMemory};
use wadi_storage::queries::{runs, sessions};
use wadi_storage::Database;

use crate::request::{validate_shape, RunReceipt, RunRequest, GENERATION_REASON, REFUND_REASON};

/// Default page size for run listings.
const DEFAULT_LIST_LIMIT: usize = 20;
/// Largest page size for run listings.
const MAX_LIST_LIMIT: usize = 100;

/// Tunables that do not change per request.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Token budget for the memory context block.
    pub context_max_tokens: usize,
    /// Store each completed run as a project memory.
    pub record_runs: bool,
    /// Passed through to the provider; `None` uses the provider default.
    pub max_tokens: Option<u32>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            context_max_tokens: 1000,
            record_runs: true,
            max_tokens: None,
        }
    }
}

fn record_elapsed(status: &str, billing: &Billing) {
    wadi_prometheus::record_run("http", status, billing.started.elapsed().as_secs_f64());
}

/// Debit, generation and persistence for runs.
#[derive(Clone)]
pub struct RunOrchestrator {
    pub(crate) db: Database,
    pub(crate) ledger: CreditLedger,
    pub(crate) provider: Arc<dyn ProviderAdapter>,
    pub(crate) memory: Option<MemoryService>,
    pub(crate) options: OrchestratorOptions,
}

/// State captured after a successful debit, needed to finish or refund.
pub(crate) struct Billing {
    pub(crate) session: Session,
    pub(crate) cost: i64,
    pub(crate) credits_remaining: i64,
    pub(crate) started: Instant,
}

impl RunOrchestrator {
    pub fn new(
        db: Database,
        ledger: CreditLedger,
        provider: Arc<dyn ProviderAdapter>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            db,
            ledger,
            provider,
            memory: None,
            options,
        }
    }

    /// Enables memory context and run recording.
    pub fn with_memory(mut self, memory: MemoryService) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    pub fn memory(&self) -> Option<&MemoryService> {
        self.memory.as_ref()
    }

    /// Generate, bill and persist one run.
    ///
    /// Validation and balance failures happen before any debit. A provider
    /// or persistence failure after the debit is refunded before the error
    /// is returned.
    pub async fn create_run(&self, request: RunRequest) -> Result<RunReceipt, WadiError> {
        let billing = self.validate_and_debit(&request).await?;
        let messages = self.build_messages(&request).await;

        let provider_request = ProviderRequest {
            model: request.model.clone(),
            messages,
            max_tokens: self.options.max_tokens,
        };

        let output = match self.provider.complete(provider_request).await {
            Ok(response) => response.text,
            Err(e) => {
                self.refund(&request, billing.cost, None, &e).await;
                record_elapsed("failed", &billing);
                return Err(e);
            }
        };

        let mut run = runs::new_run(
            &request.user_id,
            &request.project_id,
            &request.input,
            &request.model,
            Some(billing.session.id.clone()),
            RunStatus::Complete,
        );
        run.output = output;

        if let Err(e) = runs::insert_run(&self.db, &run).await {
            error!(run_id = %run.id, error = %e, "failed to persist completed run");
            self.refund(&request, billing.cost, Some(&run.id), &e).await;
            record_elapsed("failed", &billing);
            return Err(e);
        }

        info!(
            run_id = %run.id,
            user_id = %run.user_id,
            project_id = %run.project_id,
            model = %run.model,
            credits_used = billing.cost,
            "run completed"
        );
        record_elapsed("complete", &billing);
        self.record_memory(&run).await;

        Ok(RunReceipt {
            run,
            credits_used: billing.cost,
            credits_remaining: billing.credits_remaining,
        })
    }

    /// Recent runs for a project, newest first.
    pub async fn list_runs(
        &self,
        user_id: &str,
        project_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Run>, WadiError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        runs::list_runs(&self.db, user_id, project_id, limit).await
    }

    /// Number of runs `user_id` has made in a project, ignoring any limit.
    pub async fn count_runs(&self, user_id: &str, project_id: &str) -> Result<u64, WadiError> {
        runs::count_runs(&self.db, user_id, project_id).await
    }

    /// A single run owned by `user_id`.
    ///
    /// Runs owned by other users are reported as not found.
    pub async fn get_run(&self, user_id: &str, run_id: &str) -> Result<Run, WadiError> {
        match runs::get_run(&self.db, run_id).await? {
            Some(run) if run.user_id == user_id => Ok(run),
            _ => Err(WadiError::NotFound(format!("run {run_id}"))),
        }
    }

    /// Close the caller's active session for a project.
    ///
    /// The next run in that project starts a new session.
    pub async fn close_session(&self, user_id: &str, project_id: &str) -> Result<bool, WadiError> {
        sessions::close_active_session(&self.db, user_id, project_id).await
    }

    /// Steps 1 to 5 of a run: validate, session, cost, balance check, debit.
    pub(crate) async fn validate_and_debit(
        &self,
        request: &RunRequest,
    ) -> Result<Billing, WadiError> {
        validate_shape(request)?;
        if self.provider.resolve_model(&request.model).is_none() {
            return Err(WadiError::InvalidInput(format!(
                "unsupported model: {}",
                request.model
            )));
        }

        let session =
            sessions::get_or_create_active_session(&self.db, &request.user_id, &request.project_id)
                .await?;

        let cost = credit_cost(&request.model);
        let balance = self.ledger.get_balance(&request.user_id).await?;
        if balance < cost {
            debug!(
                user_id = %request.user_id,
                required = cost,
                available = balance,
                "run rejected: insufficient credits"
            );
            return Err(WadiError::InsufficientCredits {
                required: cost,
                available: balance,
            });
        }

        let started = Instant::now();
        self.ledger
            .debit(
                &request.user_id,
                cost,
                GENERATION_REASON,
                json!({ "model": request.model, "project": request.project_id }),
            )
            .await?;

        Ok(Billing {
            session,
            cost,
            credits_remaining: balance - cost,
            started,
        })
    }

    /// Provider messages for a request, with memory context when available.
    pub(crate) async fn build_messages(&self, request: &RunRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(memory) = &self.memory {
            match memory
                .get_context(
                    &request.user_id,
                    &request.project_id,
                    &request.input,
                    self.options.context_max_tokens,
                )
                .await
            {
                Ok(context) if !context.is_empty() => {
                    messages.push(ChatMessage::system(format!(
                        "Relevant context from earlier in this project:\n{context}"
                    )));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        project_id = %request.project_id,
                        error = %e,
                        "memory context unavailable"
                    );
                }
            }
        }
        messages.push(ChatMessage::user(request.input.clone()));
        messages
    }

    /// Credit back a debited run. Failures are logged, never returned.
    pub(crate) async fn refund(
        &self,
        request: &RunRequest,
        cost: i64,
        run_id: Option<&str>,
        cause: &WadiError,
    ) {
        let metadata = json!({
            "model": request.model,
            "project": request.project_id,
            "run_id": run_id,
            "error": cause.to_string(),
        });
        match self
            .ledger
            .credit(&request.user_id, cost, REFUND_REASON, metadata)
            .await
        {
            Ok(balance) => {
                wadi_prometheus::record_refund(cost);
                info!(user_id = %request.user_id, amount = cost, balance, "generation refunded");
            }
            Err(e) => {
                wadi_prometheus::record_refund_failure();
                error!(
                    user_id = %request.user_id,
                    amount = cost,
                    cause = %cause,
                    error = %e,
                    "refund failed"
                );
            }
        }
    }

    /// Store a finished run as memory when enabled.
    pub(crate) async fn record_memory(&self, run: &Run) {
        let Some(memory) = &self.memory else {
            return;
        };
        if !self.options.record_runs || run.output.is_empty() {
            return;
        }
        let content = format!("User: {}\nAssistant: {}", run.input, run.output);
        let entry = NewMemory {
            content,
            metadata: json!({ "model": run.model }),
            run_id: Some(run.id.clone()),
            embedding: None,
        };
        if let Err(e) = memory.store(&run.user_id, &run.project_id, entry).await {
            warn!(run_id = %run.id, error = %e, "failed to record run as memory");
        }
    }
}
