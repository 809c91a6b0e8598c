// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory service: embedding, similarity search, context assembly, pruning.

use std::sync::Arc;

use tracing::{debug, info};
use wadi_core::types::EmbeddingInput;
use wadi_core::{EmbeddingAdapter, WadiError};
use wadi_storage::now_timestamp;

use crate::store::MemoryStore;
use crate::types::{
    cosine_similarity, estimate_tokens, MemoryEntry, MemorySearchResult, CONTEXT_SEARCH_LIMIT,
    MAX_MEMORIES_PER_PROJECT, SIMILARITY_THRESHOLD,
};

/// A memory to store.
#[derive(Debug, Clone, Default)]
pub struct NewMemory {
    pub content: String,
    pub metadata: serde_json::Value,
    pub run_id: Option<String>,
    /// Precomputed embedding; computed via the embedder when absent.
    pub embedding: Option<Vec<f32>>,
}

/// Vector memory for (user, project) scopes.
///
/// Pruning runs after each insert as a separate count-then-delete, so two
/// concurrent stores may briefly leave a project above the cap. The next
/// store brings it back down.
#[derive(Clone)]
pub struct MemoryService {
    store: MemoryStore,
    embedder: Arc<dyn EmbeddingAdapter>,
    max_per_project: usize,
}

impl MemoryService {
    pub fn new(store: MemoryStore, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            store,
            embedder,
            max_per_project: MAX_MEMORIES_PER_PROJECT,
        }
    }

    pub fn store_handle(&self) -> &MemoryStore {
        &self.store
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, WadiError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                text: text.to_string(),
                model: None,
            })
            .await?;
        Ok(output.embedding)
    }

    /// Reject a caller-supplied vector that search could not compare.
    ///
    /// The width must match the project's existing memories or, for an
    /// empty project, what the embedder produces for the same content.
    async fn check_supplied(
        &self,
        user_id: &str,
        project_id: &str,
        content: &str,
        embedding: &[f32],
    ) -> Result<(), WadiError> {
        if embedding.is_empty() {
            return Err(WadiError::InvalidInput("embedding must not be empty".into()));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(WadiError::InvalidInput("embedding values must be finite".into()));
        }

        let expected = match self.store.dimensions(user_id, project_id).await? {
            Some(width) => Some(width),
            None => match self.embed(content).await {
                Ok(reference) => Some(reference.len()),
                Err(e) => {
                    debug!(error = %e, "embedder unavailable, accepting supplied width");
                    None
                }
            },
        };
        match expected {
            Some(width) if width != embedding.len() => Err(WadiError::InvalidInput(format!(
                "embedding has {} dimensions, expected {width}",
                embedding.len()
            ))),
            _ => Ok(()),
        }
    }

    /// Persist a memory and prune the project back to its cap.
    ///
    /// Returns the new memory id.
    pub async fn store(
        &self,
        user_id: &str,
        project_id: &str,
        memory: NewMemory,
    ) -> Result<String, WadiError> {
        if memory.content.trim().is_empty() {
            return Err(WadiError::InvalidInput("memory content must not be empty".into()));
        }

        let embedding = match memory.embedding {
            Some(embedding) => {
                self.check_supplied(user_id, project_id, &memory.content, &embedding)
                    .await?;
                embedding
            }
            None => self.embed(&memory.content).await?,
        };

        let entry = MemoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            content: memory.content,
            embedding,
            metadata: if memory.metadata.is_null() {
                serde_json::json!({})
            } else {
                memory.metadata
            },
            run_id: memory.run_id,
            created_at: now_timestamp(),
        };
        self.store.insert(&entry).await?;
        debug!(user_id, project_id, memory_id = %entry.id, "memory stored");

        let count = self.store.count(user_id, project_id).await?;
        if count > self.max_per_project {
            let pruned = self
                .store
                .prune(user_id, project_id, self.max_per_project)
                .await?;
            metrics::counter!("wadi_memory_pruned_total").increment(pruned as u64);
            info!(user_id, project_id, pruned, "memory pruned to cap");
        }

        Ok(entry.id)
    }

    /// Rank a project's memories against `query`.
    ///
    /// Results below the similarity threshold are dropped; the rest are
    /// sorted by similarity, highest first, and truncated to `limit`.
    pub async fn search(
        &self,
        user_id: &str,
        project_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemorySearchResult>, WadiError> {
        let query_embedding = self.embed(query).await?;
        let candidates = self.store.list_scope(user_id, project_id).await?;

        let mut results = Vec::new();
        for entry in candidates {
            let similarity = cosine_similarity(&query_embedding, &entry.embedding)?;
            if similarity >= SIMILARITY_THRESHOLD {
                results.push(MemorySearchResult { entry, similarity });
            }
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        Ok(results)
    }

    /// Build a prompt context block from the best-matching memories.
    ///
    /// Entries are added in similarity order while the running token estimate
    /// stays within `max_tokens`; the first entry that would overflow ends
    /// the block. Entries are never truncated.
    pub async fn get_context(
        &self,
        user_id: &str,
        project_id: &str,
        query: &str,
        max_tokens: usize,
    ) -> Result<String, WadiError> {
        let results = self
            .search(user_id, project_id, query, CONTEXT_SEARCH_LIMIT)
            .await?;

        let mut lines = Vec::new();
        let mut used = 0;
        for result in &results {
            let line = format!("- {}", result.entry.content);
            let cost = estimate_tokens(&line);
            if used + cost > max_tokens {
                break;
            }
            used += cost;
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// Number of memories stored for a project.
    pub async fn count(&self, user_id: &str, project_id: &str) -> Result<usize, WadiError> {
        self.store.count(user_id, project_id).await
    }

    /// Remove every memory of one project.
    pub async fn clear_project(&self, user_id: &str, project_id: &str) -> Result<usize, WadiError> {
        let deleted = self.store.delete_project(user_id, project_id).await?;
        info!(user_id, project_id, deleted, "project memory cleared");
        Ok(deleted)
    }

    /// Remove every memory a user owns.
    pub async fn clear_user(&self, user_id: &str) -> Result<usize, WadiError> {
        let deleted = self.store.delete_user(user_id).await?;
        info!(user_id, deleted, "user memory cleared");
        Ok(deleted)
    }
}
