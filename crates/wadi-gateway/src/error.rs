// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON error responses.
//!
//! Every error body carries `error` (message) and `code` (stable machine
//! code). Insufficient credits add `required` and `available`; provider
//! failures add `details: {model, timestamp}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wadi_core::WadiError;

/// A [`WadiError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: WadiError,
    model: Option<String>,
}

impl ApiError {
    /// Attach the requested model, reported in provider error details.
    pub fn with_model(error: WadiError, model: impl Into<String>) -> Self {
        Self {
            error,
            model: Some(model.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn body(&self) -> serde_json::Value {
        let message = match &self.error {
            WadiError::Storage { .. } | WadiError::Internal(_) | WadiError::Config(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let mut body = json!({
            "error": message,
            "code": self.error.code(),
        });
        match &self.error {
            WadiError::InsufficientCredits {
                required,
                available,
            } => {
                body["required"] = json!(required);
                body["available"] = json!(available);
            }
            WadiError::Provider { retryable, .. } => {
                body["details"] = json!({
                    "model": self.model,
                    "retryable": retryable,
                    "timestamp": wadi_storage::now_timestamp(),
                });
            }
            _ => {}
        }
        body
    }
}

impl From<WadiError> for ApiError {
    fn from(error: WadiError) -> Self {
        Self { error, model: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, code = self.error.code(), "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
