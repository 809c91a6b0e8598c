// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::WadiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for generating vector embeddings from text.
///
/// May be backed by a different service than the chat provider.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates an embedding for the given input.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, WadiError>;
}
