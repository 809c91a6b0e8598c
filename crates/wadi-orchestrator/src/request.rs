// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run requests, receipts and input validation.

use serde::{Deserialize, Serialize};
use wadi_core::{Run, WadiError};

/// Longest accepted input, in characters.
pub const MAX_INPUT_CHARS: usize = 5000;

/// Ledger reason for the per-run debit.
pub const GENERATION_REASON: &str = "generation";

/// Ledger reason for the compensating credit after a failed generation.
pub const REFUND_REASON: &str = "generation failed — refund";

/// A request to generate one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub user_id: String,
    pub project_id: String,
    pub input: String,
    /// Friendly model name; also keys the credit cost table.
    pub model: String,
}

/// Result of a completed non-streaming run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReceipt {
    pub run: Run,
    pub credits_used: i64,
    /// Balance before the debit minus the cost, not re-read after the run.
    pub credits_remaining: i64,
}

/// Checks that need no I/O: non-empty project and input, input length.
pub(crate) fn validate_shape(request: &RunRequest) -> Result<(), WadiError> {
    if request.project_id.trim().is_empty() {
        return Err(WadiError::InvalidInput("project id must not be empty".into()));
    }
    if request.input.trim().is_empty() {
        return Err(WadiError::InvalidInput("input must not be empty".into()));
    }
    let chars = request.input.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(WadiError::InvalidInput(format!(
            "input is {chars} characters; the limit is {MAX_INPUT_CHARS}"
        )));
    }
    if request.model.trim().is_empty() {
        return Err(WadiError::InvalidInput("model must not be empty".into()));
    }
    Ok(())
}
