// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies popped
//! from a FIFO queue. Streaming splits the reply text at spaces, so the
//! concatenated chunks always equal the non-streaming text.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use wadi_core::types::{AdapterType, HealthStatus};
use wadi_core::{
    PluginAdapter, ProviderAdapter, ProviderRequest, ProviderResponse, TextStream, WadiError,
};

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeeds with this text.
    Text(String),
    /// Fails before producing any output.
    Error { message: String, retryable: bool },
    /// Streams `chunks`, then fails. Non-streaming calls fail outright.
    PartialThenError { chunks: Vec<String>, message: String },
    /// Streams `chunks`, then never yields again.
    PartialThenHang { chunks: Vec<String> },
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        MockReply::Error {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited() -> Self {
        MockReply::Error {
            message: "rate limited".into(),
            retryable: true,
        }
    }
}

fn provider_error(message: &str, retryable: bool) -> WadiError {
    WadiError::Provider {
        message: message.to_string(),
        retryable,
        source: None,
    }
}

/// Splits text at spaces, keeping the separator on the left chunk.
pub fn split_chunks(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

/// A mock chat provider that returns scripted replies.
///
/// When the queue is empty, "mock response" is returned.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    calls: AtomicUsize,
    chunk_delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
            chunk_delay: None,
        }
    }

    /// Create a mock provider that answers each call with the next text.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::with_replies(responses.into_iter().map(MockReply::Text).collect())
    }

    /// Sleep this long before each streamed chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub async fn push_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `complete` and `complete_stream` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self, request: ProviderRequest) -> MockReply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::text("mock response"))
    }

    fn delayed(&self, items: Vec<Result<String, WadiError>>) -> TextStream {
        let delay = self.chunk_delay;
        stream::iter(items)
            .then(move |item| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                item
            })
            .boxed()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, WadiError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WadiError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, WadiError> {
        let model = request.model.clone();
        match self.next_reply(request).await {
            MockReply::Text(text) => Ok(ProviderResponse { text, model }),
            MockReply::PartialThenHang { chunks } => Ok(ProviderResponse {
                text: chunks.concat(),
                model,
            }),
            MockReply::Error { message, retryable } => Err(provider_error(&message, retryable)),
            MockReply::PartialThenError { message, .. } => Err(provider_error(&message, false)),
        }
    }

    async fn complete_stream(&self, request: ProviderRequest) -> Result<TextStream, WadiError> {
        match self.next_reply(request).await {
            MockReply::Text(text) => {
                let items = split_chunks(&text).into_iter().map(Ok).collect();
                Ok(self.delayed(items))
            }
            MockReply::Error { message, retryable } => Err(provider_error(&message, retryable)),
            MockReply::PartialThenError { chunks, message } => {
                let mut items: Vec<_> = chunks.into_iter().map(Ok).collect();
                items.push(Err(provider_error(&message, false)));
                Ok(self.delayed(items))
            }
            MockReply::PartialThenHang { chunks } => {
                let items = chunks.into_iter().map(Ok).collect();
                Ok(self.delayed(items).chain(stream::pending()).boxed())
            }
        }
    }

    /// Accepts the GPT, Llama and Mixtral families unchanged.
    fn resolve_model(&self, model: &str) -> Option<String> {
        ["gpt-", "llama", "mixtral"]
            .iter()
            .any(|prefix| model.starts_with(prefix))
            .then(|| model.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wadi_core::ChatMessage;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::user("hello")],
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let provider = MockProvider::new();
        let resp = provider.complete(request()).await.unwrap();
        assert_eq!(resp.text, "mock response");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn streamed_chunks_concatenate_to_text() {
        let provider = MockProvider::with_responses(vec!["hi there friend".into()]);
        let chunks: Vec<String> = provider
            .complete_stream(request())
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["hi ", "there ", "friend"]);
        assert_eq!(chunks.concat(), "hi there friend");
    }

    #[tokio::test]
    async fn partial_then_error_yields_error_last() {
        let provider = MockProvider::with_replies(vec![MockReply::PartialThenError {
            chunks: vec!["a".into(), "b".into()],
            message: "upstream reset".into(),
        }]);
        let items: Vec<_> = provider.complete_stream(request()).await.unwrap().collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[2].is_err());
    }

    #[test]
    fn resolves_known_families_only() {
        let provider = MockProvider::new();
        assert!(provider.resolve_model("gpt-4").is_some());
        assert!(provider.resolve_model("llama-3.1-8b-instant").is_some());
        assert!(provider.resolve_model("claude-3").is_none());
    }
}
