// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for memory tests.

use std::collections::HashMap;

use async_trait::async_trait;

use wadi_core::types::{AdapterType, HealthStatus};
use wadi_core::{EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, PluginAdapter, WadiError};

/// Embedding width produced for texts without an override.
pub const MOCK_DIMENSIONS: usize = 16;

/// Embeds text as a hashed bag of words.
///
/// Texts sharing words score high cosine similarity; identical texts score
/// exactly 1.0. Specific texts can be pinned to explicit vectors.
pub struct MockEmbedder {
    overrides: HashMap<String, Vec<f32>>,
    available: bool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            available: true,
        }
    }

    /// An embedder that fails every call, like an unconfigured backend.
    pub fn unavailable() -> Self {
        Self {
            overrides: HashMap::new(),
            available: false,
        }
    }

    /// Pin `text` to `vector`.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.overrides.insert(text.into(), vector);
        self
    }

    fn hashed(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let mut hash: u32 = 0x811c_9dc5;
            for byte in word.to_lowercase().bytes() {
                hash ^= u32::from(byte);
                hash = hash.wrapping_mul(0x0100_0193);
            }
            vector[hash as usize % MOCK_DIMENSIONS] += 1.0;
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, WadiError> {
        if self.available {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded("not configured".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), WadiError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, WadiError> {
        if !self.available {
            return Err(WadiError::Embedding(
                "embedding provider not configured".into(),
            ));
        }
        let embedding = self
            .overrides
            .get(&input.text)
            .cloned()
            .unwrap_or_else(|| Self::hashed(&input.text));
        Ok(EmbeddingOutput {
            embedding,
            model: input.model.unwrap_or_else(|| "mock-embedding".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> EmbeddingInput {
        EmbeddingInput {
            text: text.into(),
            model: None,
        }
    }

    #[tokio::test]
    async fn same_text_same_vector() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed(input("rust borrow checker")).await.unwrap();
        let b = embedder.embed(input("rust borrow checker")).await.unwrap();
        assert_eq!(a.embedding, b.embedding);
        assert_eq!(a.embedding.len(), MOCK_DIMENSIONS);
    }

    #[tokio::test]
    async fn override_wins() {
        let embedder = MockEmbedder::new().with_vector("q", vec![1.0, 0.0]);
        let out = embedder.embed(input("q")).await.unwrap();
        assert_eq!(out.embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn unavailable_embedder_errors() {
        let err = MockEmbedder::unavailable().embed(input("x")).await.unwrap_err();
        assert_eq!(err.code(), "EMBEDDING_ERROR");
    }
}
