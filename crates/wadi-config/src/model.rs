// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level WADI configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WadiConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP and WebSocket gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat-completion backend.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Embedding backend (may differ from the chat backend).
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Vector memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Prometheus exporter.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name reported by `/health` and in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "wadi".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP/WebSocket gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static bearer tokens, mapped to the user id they authenticate as.
    #[serde(default)]
    pub tokens: HashMap<String, String>,

    /// Seconds between server-sent socket pings.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Seconds a socket may stay open without authenticating.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tokens", &format_args!("[{} REDACTED]", self.tokens.len()))
            .field("heartbeat_interval_secs", &self.heartbeat_interval_secs)
            .field("auth_timeout_secs", &self.auth_timeout_secs)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tokens: HashMap::new(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            auth_timeout_secs: default_auth_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_auth_timeout_secs() -> u64 {
    30
}

/// Chat-completion provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Backend family: `openai` or `groq`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// API key. Falls back to `OPENAI_API_KEY`/`GROQ_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the backend's default base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient upstream failures.
    #[serde(default)]
    pub max_retries: u32,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_backend() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    120
}

/// Embedding backend configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// API key. Embeddings are disabled when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embeddings API base URL.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wadi").join("wadi.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("wadi.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Vector memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Inject retrieved memories into generation prompts.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Store each completed run as a memory.
    #[serde(default = "default_true")]
    pub record_runs: bool,

    /// Token budget for injected context (estimated at 4 chars per token).
    #[serde(default = "default_context_max_tokens")]
    pub context_max_tokens: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_runs: true,
            context_max_tokens: default_context_max_tokens(),
        }
    }
}

fn default_context_max_tokens() -> usize {
    1000
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}
