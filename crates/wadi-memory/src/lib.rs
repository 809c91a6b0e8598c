// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector memory for WADI.
//!
//! Stores (content, embedding) pairs per user and project, ranks them by
//! cosine similarity against a query, and keeps each project under a fixed
//! capacity by evicting the oldest entries.

pub mod service;
pub mod store;
pub mod types;

pub use service::{MemoryService, NewMemory};
pub use store::MemoryStore;
pub use types::{
    cosine_similarity, MemoryEntry, MemorySearchResult, DEFAULT_SEARCH_LIMIT,
    MAX_MEMORIES_PER_PROJECT, SIMILARITY_THRESHOLD,
};
