// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the ledger, memory store, orchestrator and transports.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Embedding,
    Auth,
}

// --- Runs and sessions ---

/// Lifecycle state of a [`Run`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Complete,
    Stopped,
    Failed,
}

impl RunStatus {
    /// Terminal states freeze a run's output.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Pending)
    }
}

/// One generation request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub input: String,
    pub output: String,
    /// Model name as requested by the client.
    pub model: String,
    pub session_id: Option<String>,
    pub status: RunStatus,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Session state. At most one `active` session per (user, project).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Closed,
}

/// A grouping of runs for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub state: SessionState,
    pub created_at: String,
}

// --- Credits ---

/// Direction of a ledger movement. Amounts are always stored positive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CreditKind {
    Debit,
    Credit,
}

/// Immutable usage history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub id: i64,
    pub user_id: String,
    pub kind: CreditKind,
    pub amount: i64,
    pub reason: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl CreditEntry {
    /// Balance delta: negative for debits.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            CreditKind::Debit => -self.amount,
            CreditKind::Credit => self.amount,
        }
    }
}

// --- Provider types ---

/// Chat message author.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A `{role, content}` pair sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A request to a chat-completion provider.
///
/// `model` is the friendly name; the provider resolves it to a backend model.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
}

/// A complete response from a chat-completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub text: String,
    /// Concrete backend model that answered.
    pub model: String,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub text: String,
    /// Overrides the adapter's configured model.
    pub model: Option<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embedding: Vec<f32>,
    pub model: String,
}

// --- Auth types ---

/// A bearer token to be verified.
#[derive(Clone)]
pub struct AuthToken(pub String);

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// A verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
}
