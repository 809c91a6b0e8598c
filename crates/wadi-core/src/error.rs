// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the WADI generation service.

use thiserror::Error;

/// The primary error type used across all WADI adapters and core operations.
#[derive(Debug, Error)]
pub enum WadiError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller mistake: empty or oversized input, unrecognized model name.
    #[error("{0}")]
    InvalidInput(String),

    /// The user's balance does not cover the cost of the request.
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    /// Upstream generation failure.
    ///
    /// `retryable` is true for rate limiting and transient server errors,
    /// false for authentication and configuration failures.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        retryable: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding backend unavailable or misconfigured.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Two vectors of different length were compared.
    #[error("embedding dimension mismatch: {left} != {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A requested record does not exist or is not visible to the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WadiError {
    /// Builds a non-retryable provider error with no source.
    pub fn provider(message: impl Into<String>) -> Self {
        WadiError::Provider {
            message: message.into(),
            retryable: false,
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        WadiError::Storage {
            source: Box::new(e),
        }
    }

    /// Stable machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            WadiError::Config(_) => "CONFIG_ERROR",
            WadiError::Storage { .. } => "STORAGE_ERROR",
            WadiError::InvalidInput(_) => "INVALID_INPUT",
            WadiError::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            WadiError::Provider { .. } => "AI_GENERATION_ERROR",
            WadiError::Embedding(_) => "EMBEDDING_ERROR",
            WadiError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            WadiError::NotFound(_) => "NOT_FOUND",
            WadiError::Unauthorized => "UNAUTHORIZED",
            WadiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code used by the gateway when surfacing this error.
    pub fn status_code(&self) -> u16 {
        match self {
            WadiError::InvalidInput(_) => 400,
            WadiError::Unauthorized => 401,
            WadiError::InsufficientCredits { .. } => 402,
            WadiError::NotFound(_) => 404,
            WadiError::Embedding(_) => 503,
            _ => 500,
        }
    }

    /// Whether the failure is worth retrying upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WadiError::Provider {
                retryable: true,
                ..
            }
        )
    }
}
