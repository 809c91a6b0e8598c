// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for chat-completion backends.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::WadiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Lazy, single-pass sequence of non-empty text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, WadiError>> + Send>>;

/// Adapter for chat-completion providers.
///
/// The same interface is exposed regardless of which backend model family
/// answers; friendly model names are translated by [`resolve_model`].
///
/// [`resolve_model`]: ProviderAdapter::resolve_model
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full text.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, WadiError>;

    /// Sends a completion request and returns a stream of text chunks.
    ///
    /// Errors may surface either from this call or from the stream itself.
    async fn complete_stream(&self, request: ProviderRequest) -> Result<TextStream, WadiError>;

    /// Maps a friendly model name to the concrete backend identifier.
    ///
    /// Returns `None` when the name is neither aliased nor matches a
    /// recognized prefix for the active backend family.
    fn resolve_model(&self, model: &str) -> Option<String>;
}
