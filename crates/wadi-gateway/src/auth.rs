// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the gateway.
//!
//! Bearer tokens map to user ids through a static table. When the table is
//! empty, every request is rejected (fail-closed).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use wadi_core::types::{AdapterType, HealthStatus};
use wadi_core::{AuthAdapter, AuthIdentity, AuthToken, PluginAdapter, WadiError};

use crate::error::ApiError;

/// Token table authenticator.
#[derive(Clone)]
pub struct StaticTokenAuth {
    tokens: Arc<HashMap<String, String>>,
}

impl StaticTokenAuth {
    /// `tokens` maps bearer token to user id.
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self {
            tokens: Arc::new(tokens),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("tokens", &format!("[{} redacted]", self.tokens.len()))
            .finish()
    }
}

#[async_trait]
impl PluginAdapter for StaticTokenAuth {
    fn name(&self) -> &str {
        "static-token"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, WadiError> {
        if self.tokens.is_empty() {
            Ok(HealthStatus::Degraded("no tokens configured".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), WadiError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for StaticTokenAuth {
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, WadiError> {
        match self.tokens.get(&token.0) {
            Some(user_id) => Ok(AuthIdentity {
                user_id: user_id.clone(),
            }),
            None => Err(WadiError::Unauthorized),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that authenticates the bearer token and stores the caller's
/// [`AuthIdentity`] in the request extensions.
pub async fn auth_middleware(
    State(auth): State<Arc<dyn AuthAdapter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let Some(token) = token else {
        return ApiError::from(WadiError::Unauthorized).into_response();
    };

    match auth.authenticate(AuthToken(token)).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "bearer authentication rejected");
            ApiError::from(WadiError::Unauthorized).into_response()
        }
    }
}
