// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the run pipeline with mock adapters and a temp
//! SQLite database: ledger, optional memory, and a [`RunOrchestrator`].

use std::sync::Arc;
use std::time::Duration;

use wadi_core::{CreditEntry, WadiError};
use wadi_credits::CreditLedger;
use wadi_memory::{MemoryService, MemoryStore};
use wadi_orchestrator::{OrchestratorOptions, RunOrchestrator, RunReceipt, RunRequest};
use wadi_storage::Database;

use crate::mock_embedder::MockEmbedder;
use crate::mock_provider::{MockProvider, MockReply};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    balances: Vec<(String, i64)>,
    embedder: Option<MockEmbedder>,
    record_runs: bool,
    chunk_delay: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            balances: Vec::new(),
            embedder: None,
            record_runs: false,
            chunk_delay: None,
        }
    }

    /// Set mock provider text responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.replies = responses.into_iter().map(MockReply::Text).collect();
        self
    }

    /// Set scripted mock provider replies, including failures.
    pub fn with_mock_replies(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Seed a user's balance with a `grant` credit.
    pub fn with_balance(mut self, user_id: &str, amount: i64) -> Self {
        self.balances.push((user_id.to_string(), amount));
        self
    }

    /// Enable vector memory backed by `embedder`.
    pub fn with_memory(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Store completed runs as memories (requires memory).
    pub fn with_run_recording(mut self) -> Self {
        self.record_runs = true;
        self
    }

    /// Delay each streamed chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, WadiError> {
        let temp_dir = tempfile::TempDir::new().map_err(WadiError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy(), true).await?;

        let ledger = CreditLedger::from_database(&db);
        for (user_id, amount) in &self.balances {
            if *amount > 0 {
                ledger
                    .credit(user_id, *amount, "grant", serde_json::json!({}))
                    .await?;
            }
        }

        let mut provider = MockProvider::with_replies(self.replies);
        if let Some(delay) = self.chunk_delay {
            provider = provider.with_chunk_delay(delay);
        }
        let mock_provider = Arc::new(provider);

        let options = OrchestratorOptions {
            record_runs: self.record_runs,
            ..OrchestratorOptions::default()
        };
        let mut orchestrator =
            RunOrchestrator::new(db.clone(), ledger.clone(), mock_provider.clone(), options);

        let memory = self.embedder.map(|embedder| {
            MemoryService::new(MemoryStore::from_database(&db), Arc::new(embedder))
        });
        if let Some(memory) = &memory {
            orchestrator = orchestrator.with_memory(memory.clone());
        }

        Ok(TestHarness {
            mock_provider,
            db,
            ledger,
            memory,
            orchestrator,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock chat provider.
    pub mock_provider: Arc<MockProvider>,
    /// Database handle (temp file, cleaned up on drop).
    pub db: Database,
    pub ledger: CreditLedger,
    /// Present when built with [`TestHarnessBuilder::with_memory`].
    pub memory: Option<MemoryService>,
    pub orchestrator: RunOrchestrator,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run a non-streaming generation.
    pub async fn create_run(
        &self,
        user_id: &str,
        project_id: &str,
        input: &str,
        model: &str,
    ) -> Result<RunReceipt, WadiError> {
        self.orchestrator
            .create_run(RunRequest {
                user_id: user_id.to_string(),
                project_id: project_id.to_string(),
                input: input.to_string(),
                model: model.to_string(),
            })
            .await
    }

    pub async fn balance(&self, user_id: &str) -> i64 {
        self.ledger.get_balance(user_id).await.unwrap_or(-1)
    }

    /// Newest-first history, excluding the seeding grant entries.
    pub async fn usage_history(&self, user_id: &str) -> Result<Vec<CreditEntry>, WadiError> {
        let entries = self.ledger.history(user_id, 100).await?;
        Ok(entries.into_iter().filter(|e| e.reason != "grant").collect())
    }
}
