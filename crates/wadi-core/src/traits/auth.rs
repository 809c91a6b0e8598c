// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait for identity verification.

use async_trait::async_trait;

use crate::error::WadiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthIdentity, AuthToken};

/// Resolves bearer tokens to user identities.
///
/// Token issuance is delegated to an external identity provider; adapters
/// only verify.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Authenticates the given token and returns the verified identity.
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, WadiError>;
}
