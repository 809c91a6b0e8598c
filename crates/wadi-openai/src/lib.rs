// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapters for WADI.
//!
//! [`OpenAiProvider`] implements [`ProviderAdapter`] against any backend that
//! speaks the OpenAI chat-completions protocol (OpenAI itself, Groq).
//! [`OpenAiEmbedder`] implements [`EmbeddingAdapter`] and may point at a
//! different backend than the chat provider.

pub mod client;
pub mod models;
pub mod sse;
pub mod types;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use wadi_config::model::{EmbeddingConfig, ProviderConfig};
use wadi_core::error::WadiError;
use wadi_core::traits::{EmbeddingAdapter, PluginAdapter, ProviderAdapter, TextStream};
use wadi_core::types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus, ProviderRequest,
    ProviderResponse,
};

use crate::client::OpenAiClient;
use crate::models::{Backend, ModelTable};
use crate::types::{ApiMessage, ChatCompletionRequest, EmbeddingRequest};

/// Chat-completion provider for OpenAI-compatible backends.
///
/// API key resolution order: config, then the backend's env var
/// (`OPENAI_API_KEY` / `GROQ_API_KEY`), else a configuration error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    models: ModelTable,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Creates a provider from the `[provider]` config section.
    pub fn new(config: &ProviderConfig) -> Result<Self, WadiError> {
        let backend = Backend::from_str(&config.backend).map_err(|_| {
            WadiError::Config(format!("unknown provider backend `{}`", config.backend))
        })?;
        let api_key = resolve_api_key(&config.api_key, backend.api_key_env())?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| backend.default_base_url().to_string());

        let client = OpenAiClient::new(
            &api_key,
            &base_url,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )?;

        info!(
            backend = %backend,
            base_url = %base_url,
            alias_table_version = models::ALIAS_TABLE_VERSION,
            "provider initialized"
        );

        Ok(Self::with_client(client, backend, config.max_tokens))
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: OpenAiClient, backend: Backend, max_tokens: u32) -> Self {
        Self {
            client,
            models: ModelTable::for_backend(backend),
            max_tokens,
        }
    }

    /// Converts a [`ProviderRequest`] to the wire request, resolving the model.
    fn to_api_request(
        &self,
        request: &ProviderRequest,
    ) -> Result<ChatCompletionRequest, WadiError> {
        let model = self.models.resolve(&request.model).ok_or_else(|| {
            WadiError::InvalidInput(format!("unsupported model: {}", request.model))
        })?;
        Ok(ChatCompletionRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            stream: false,
        })
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        match self.models.backend() {
            Backend::OpenAi => "openai",
            Backend::Groq => "groq",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, WadiError> {
        // No API call here: health checks must not consume tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WadiError> {
        debug!("provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, WadiError> {
        let api_request = self.to_api_request(&request)?;
        let response = self.client.chat_completion(&api_request).await?;

        let text = response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        Ok(ProviderResponse {
            text,
            model: response.model,
        })
    }

    async fn complete_stream(&self, request: ProviderRequest) -> Result<TextStream, WadiError> {
        let api_request = self.to_api_request(&request)?;
        self.client.chat_completion_stream(&api_request).await
    }

    fn resolve_model(&self, model: &str) -> Option<String> {
        self.models.resolve(model)
    }
}

/// Embedding adapter for the OpenAI `/embeddings` API.
///
/// Constructed even without an API key; every call then fails with
/// [`WadiError::Embedding`] so memory features degrade instead of blocking
/// startup.
pub struct OpenAiEmbedder {
    client: Option<OpenAiClient>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder from the `[embedding]` config section.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, WadiError> {
        let client = match config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Some(OpenAiClient::new(
                key,
                &config.base_url,
                Duration::from_secs(30),
                0,
            )?),
            None => {
                info!("embedding API key not set, memory embeddings disabled");
                None
            }
        };
        Ok(Self {
            client,
            model: config.model.clone(),
        })
    }

    /// Creates an embedder around an existing client.
    pub fn with_client(client: Option<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embeddings"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, WadiError> {
        if self.is_configured() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded("embedding provider not configured".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), WadiError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, WadiError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| WadiError::Embedding("embedding provider not configured".into()))?;

        let model = input.model.unwrap_or_else(|| self.model.clone());
        let response = client
            .embeddings(&EmbeddingRequest {
                model: model.clone(),
                input: input.text,
            })
            .await
            .map_err(|e| WadiError::Embedding(e.to_string()))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| WadiError::Embedding("embeddings response had no data".into()))?;

        Ok(EmbeddingOutput { embedding, model })
    }
}

/// Resolves the API key from config or the backend's environment variable.
fn resolve_api_key(config_key: &Option<String>, env_var: &str) -> Result<String, WadiError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(env_var).map_err(|_| {
        WadiError::Config(format!(
            "provider API key not found. Set provider.api_key in config or {env_var}."
        ))
    })
}
