// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP, SSE and WebSocket transports for WADI.
//!
//! Every `/v1` route is authenticated with a bearer token. The socket
//! transport authenticates in-band with an `auth` message instead.
//! Runs are delegated to a shared [`wadi_orchestrator::RunOrchestrator`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod sse;
pub mod ws;

pub use auth::StaticTokenAuth;
pub use error::ApiError;
pub use registry::{ConnectionInfo, ConnectionRegistry, InMemoryConnectionRegistry};
pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig, WsSettings};
