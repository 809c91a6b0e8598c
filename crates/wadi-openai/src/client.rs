// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible APIs.
//!
//! Provides [`OpenAiClient`] which handles request construction, bearer
//! authentication, streaming SSE responses, and transient error retry.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, warn};
use wadi_core::{TextStream, WadiError};

use crate::sse;
use crate::types::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest,
    EmbeddingResponse,
};

/// Base delay before the first retry; doubled on each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// HTTP client for one OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, WadiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| WadiError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WadiError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                retryable: false,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a non-streaming chat completion.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, WadiError> {
        let mut req = request.clone();
        req.stream = false;
        let response = self.post("/chat/completions", &req).await?;
        let body = response.text().await.map_err(|e| WadiError::Provider {
            message: format!("failed to read response body: {e}"),
            retryable: false,
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| WadiError::Provider {
            message: format!("failed to parse API response: {e}"),
            retryable: false,
            source: Some(Box::new(e)),
        })
    }

    /// Sends a streaming chat completion and returns its text fragments.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<TextStream, WadiError> {
        let mut req = request.clone();
        req.stream = true;
        let response = self.post("/chat/completions", &req).await?;
        Ok(sse::parse_chat_stream(response))
    }

    /// Requests an embedding for a single input string.
    pub async fn embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, WadiError> {
        let response = self.post("/embeddings", request).await?;
        response.json().await.map_err(|e| WadiError::Provider {
            message: format!("failed to parse embeddings response: {e}"),
            retryable: false,
            source: Some(Box::new(e)),
        })
    }

    /// POSTs `body` to `path`, retrying transient statuses up to `max_retries`.
    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, WadiError> {
        let url = format!("{}{path}", self.base_url);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    path,
                    "retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| WadiError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    retryable: false,
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                continue;
            }
            return Err(error_from_status(status, &body));
        }

        Err(WadiError::provider(format!("request to {path} failed after retries")))
    }
}

/// Builds a provider error from a non-success HTTP status and body.
///
/// Only rate limiting is flagged retryable.
pub(crate) fn error_from_status(status: reqwest::StatusCode, body: &str) -> WadiError {
    let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => api_err.error.message,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.to_string(),
    };
    let message = match status.as_u16() {
        429 => format!("rate limited by provider: {detail}"),
        401 => format!("provider rejected credentials: {detail}"),
        _ => format!("provider returned {status}: {detail}"),
    };
    WadiError::Provider {
        message,
        retryable: status.as_u16() == 429,
        source: None,
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
