// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit accounting for WADI.
//!
//! - **Ledger**: per-user balance with atomic debit-if-sufficient and an
//!   append-only usage history
//! - **Pricing**: the static per-model credit cost table

pub mod ledger;
pub mod pricing;

pub use ledger::{CreditLedger, DebitReceipt};
pub use pricing::{credit_cost, model_tier, ModelTier};
