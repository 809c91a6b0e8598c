// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wadi_core::{AuthAdapter, WadiError};
use wadi_orchestrator::RunOrchestrator;

use crate::auth::auth_middleware;
use crate::handlers;
use crate::registry::ConnectionRegistry;
use crate::sse;
use crate::ws;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Socket timing.
#[derive(Debug, Clone, Copy)]
pub struct WsSettings {
    pub heartbeat_interval: Duration,
    /// How long a socket may stay open before a successful `auth`.
    pub auth_timeout: Duration,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            auth_timeout: Duration::from_secs(30),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: RunOrchestrator,
    pub auth: Arc<dyn AuthAdapter>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub ws: WsSettings,
    pub health: HealthState,
}

/// Bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the full application router.
///
/// - `GET /health`, `GET /metrics`: public
/// - `/v1/*`: bearer token via [`auth_middleware`]
/// - `GET /ws`: authenticated in-band by the first `auth` message
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/projects/{project_id}/runs",
            post(handlers::post_run).get(handlers::list_runs),
        )
        .route("/v1/projects/{project_id}/runs/stream", post(sse::stream_run))
        .route("/v1/runs/{run_id}", get(handlers::get_run))
        .route(
            "/v1/projects/{project_id}/session",
            delete(handlers::close_session),
        )
        .route("/v1/credits", get(handlers::get_balance))
        .route("/v1/credits/history", get(handlers::get_credit_history))
        .route(
            "/v1/projects/{project_id}/memories",
            post(handlers::post_memory).delete(handlers::delete_memories),
        )
        .route(
            "/v1/projects/{project_id}/memories/search",
            post(handlers::search_memories),
        )
        .route("/v1/connections", get(handlers::get_connections))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), WadiError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WadiError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| WadiError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
