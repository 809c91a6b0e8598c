// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for WADI integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted chat provider with chunked streaming and failure injection
//! - [`MockEmbedder`] - Deterministic embeddings with per-text overrides
//! - [`TestHarness`] - Temp SQLite database, ledger, memory and orchestrator wired together

pub mod harness;
pub mod mock_embedder;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_embedder::MockEmbedder;
pub use mock_provider::{MockProvider, MockReply};
