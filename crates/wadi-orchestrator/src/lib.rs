// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run orchestration for WADI.
//!
//! The [`RunOrchestrator`] is the only component that sequences billing,
//! generation and persistence for a run:
//! - Validates input before any side effect
//! - Reuses or creates the caller's active session
//! - Debits credits before generation and refunds them if generation fails
//! - Persists the run and optionally records it as memory
//!
//! Streaming runs are split into [`RunOrchestrator::start_stream`] (validate
//! and debit) and [`RunOrchestrator::drive_stream`] (forward chunks, persist),
//! so transports can report billing errors before opening an event stream.

pub mod orchestrator;
pub mod request;
pub mod stream;

pub use orchestrator::{OrchestratorOptions, RunOrchestrator};
pub use request::{
    RunReceipt, RunRequest, GENERATION_REASON, MAX_INPUT_CHARS, REFUND_REASON,
};
pub use stream::{RunEvent, StreamOutcome, StreamingRun};
