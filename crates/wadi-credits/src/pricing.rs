// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static credit cost table.
//!
//! Costs are keyed on the model name as the client requested it, before any
//! backend aliasing. The values are part of the public billing contract.

/// Any requested model name containing this substring is billed as premium.
pub const PREMIUM_MARKER: &str = "gpt-4";

/// Credits charged for a premium-tier generation.
pub const PREMIUM_COST: i64 = 10;

/// Credits charged for every other generation.
pub const STANDARD_COST: i64 = 1;

/// Pricing tier of a requested model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModelTier {
    Premium,
    Standard,
}

/// Classify a requested model name. Matching is a case-sensitive substring test.
pub fn model_tier(model: &str) -> ModelTier {
    if model.contains(PREMIUM_MARKER) {
        ModelTier::Premium
    } else {
        ModelTier::Standard
    }
}

/// Credits charged for one generation with `model`.
pub fn credit_cost(model: &str) -> i64 {
    match model_tier(model) {
        ModelTier::Premium => PREMIUM_COST,
        ModelTier::Standard => STANDARD_COST,
    }
}
