// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types, vector encoding and similarity.

use serde::{Deserialize, Serialize};
use wadi_core::WadiError;

/// Minimum cosine similarity for a memory to be returned by search.
pub const SIMILARITY_THRESHOLD: f32 = 0.7;

/// Maximum memories kept per (user, project). Oldest are evicted first.
pub const MAX_MEMORIES_PER_PROJECT: usize = 1000;

/// Result limit when the caller does not pass one.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Search limit used when assembling prompt context.
pub const CONTEXT_SEARCH_LIMIT: usize = 10;

/// Characters per token used for budget estimates.
pub const CHARS_PER_TOKEN: usize = 4;

/// A stored (content, embedding) pair owned by one user and project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub content: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Free-form caller metadata.
    pub metadata: serde_json::Value,
    /// Run that produced this memory, if any.
    pub run_id: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// A memory ranked against a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySearchResult {
    #[serde(flatten)]
    pub entry: MemoryEntry,
    pub similarity: f32,
}

/// Convert f32 vector to little-endian bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector. Trailing partial bytes are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity: dot product over the product of norms.
///
/// Zero when either vector has zero norm. Vectors of different length are
/// an invariant violation (mixed embedding models) and fail with
/// [`WadiError::DimensionMismatch`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, WadiError> {
    if a.len() != b.len() {
        return Err(WadiError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Token estimate for budget checks: characters / 4, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blob_round_trip() {
        let v = vec![0.5f32, -1.25, 3.0];
        assert_eq!(blob_to_vec(&vec_to_blob(&v)), v);
        assert_eq!(vec_to_blob(&v).len(), 12);
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let s = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn similarity_is_scale_invariant() {
        let s = cosine_similarity(&[1.0, 1.0], &[10.0, 10.0]).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_is_error() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            WadiError::DimensionMismatch { left: 2, right: 3 }
        ));
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    proptest! {
        #[test]
        fn similarity_is_bounded_and_symmetric(
            a in prop::collection::vec(-100.0f32..100.0, 8),
            b in prop::collection::vec(-100.0f32..100.0, 8),
        ) {
            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();
            prop_assert!((ab - ba).abs() < 1e-5);
            prop_assert!(ab <= 1.0 + 1e-4 && ab >= -1.0 - 1e-4);
        }
    }
}
