// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the WADI generation service.
//!
//! Provides the error taxonomy, domain types and adapter traits used by
//! every other crate in the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WadiError;
pub use types::{
    AdapterType, AuthIdentity, AuthToken, ChatMessage, CreditEntry, CreditKind, EmbeddingInput,
    EmbeddingOutput, HealthStatus, ProviderRequest, ProviderResponse, Role, Run, RunStatus,
    Session, SessionState,
};

pub use traits::{AuthAdapter, EmbeddingAdapter, PluginAdapter, ProviderAdapter, TextStream};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            WadiError::InvalidInput("empty".into()).code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            WadiError::InsufficientCredits {
                required: 10,
                available: 3
            }
            .code(),
            "INSUFFICIENT_CREDITS"
        );
        assert_eq!(WadiError::provider("boom").code(), "AI_GENERATION_ERROR");
        assert_eq!(
            WadiError::Embedding("not configured".into()).code(),
            "EMBEDDING_ERROR"
        );
        assert_eq!(
            WadiError::DimensionMismatch { left: 3, right: 4 }.code(),
            "DIMENSION_MISMATCH"
        );
    }

    #[test]
    fn error_status_codes() {
        assert_eq!(WadiError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(WadiError::Unauthorized.status_code(), 401);
        assert_eq!(
            WadiError::InsufficientCredits {
                required: 1,
                available: 0
            }
            .status_code(),
            402
        );
        assert_eq!(WadiError::provider("x").status_code(), 500);
        assert_eq!(WadiError::NotFound("run".into()).status_code(), 404);
    }

    #[test]
    fn provider_retryable_flag() {
        let rate_limited = WadiError::Provider {
            message: "rate limited".into(),
            retryable: true,
            source: None,
        };
        assert!(rate_limited.is_retryable());
        assert!(!WadiError::provider("bad key").is_retryable());
        assert!(!WadiError::Internal("x".into()).is_retryable());
    }

    #[test]
    fn insufficient_credits_message_carries_figures() {
        let err = WadiError::InsufficientCredits {
            required: 10,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient credits: required 10, available 3"
        );
    }

    #[test]
    fn run_status_round_trip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Complete,
            RunStatus::Stopped,
            RunStatus::Failed,
        ] {
            let s = status.to_string();
            assert_eq!(RunStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(RunStatus::Complete.to_string(), "complete");
        assert!(!RunStatus::Pending.is_terminal());
        assert!(RunStatus::Stopped.is_terminal());
    }

    #[test]
    fn run_status_serializes_lowercase() {
        let json = serde_json::to_string(&RunStatus::Stopped).unwrap();
        assert_eq!(json, "\"stopped\"");
    }

    #[test]
    fn credit_entry_signed_amount() {
        let mut entry = CreditEntry {
            id: 1,
            user_id: "u".into(),
            kind: CreditKind::Debit,
            amount: 10,
            reason: "generation".into(),
            metadata: serde_json::json!({}),
            created_at: "2026-01-01T00:00:00Z".into(),
        };
        assert_eq!(entry.signed_amount(), -10);
        entry.kind = CreditKind::Credit;
        assert_eq!(entry.signed_amount(), 10);
    }

    #[test]
    fn chat_message_serializes_role_lowercase() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken("secret-token".into());
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_auth_adapter<T: AuthAdapter>() {}
    }
}
