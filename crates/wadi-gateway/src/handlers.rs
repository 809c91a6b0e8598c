// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use wadi_core::{AuthIdentity, CreditEntry, Run, WadiError};
use wadi_memory::{MemoryService, MemorySearchResult, NewMemory, DEFAULT_SEARCH_LIMIT};
use wadi_orchestrator::{RunReceipt, RunRequest};

use crate::error::ApiError;
use crate::registry::ConnectionInfo;
use crate::server::GatewayState;

/// Default number of credit history entries returned.
const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Upper bound on any caller-supplied limit.
const MAX_LIMIT: usize = 100;

/// Request body for run creation (both plain and streaming).
#[derive(Debug, Deserialize)]
pub struct RunBody {
    pub input: String,
    pub model: String,
}

/// `?limit=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct RunListResponse {
    pub runs: Vec<Run>,
    /// All of the caller's runs in the project, not just this page.
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<CreditEntry>,
}

/// Request body for POST /v1/projects/{project_id}/memories.
#[derive(Debug, Deserialize)]
pub struct StoreMemoryBody {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Serialize)]
pub struct StoreMemoryResponse {
    pub id: String,
}

/// Request body for POST /v1/projects/{project_id}/memories/search.
#[derive(Debug, Deserialize)]
pub struct SearchMemoryBody {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchMemoryResponse {
    pub results: Vec<MemorySearchResult>,
}

#[derive(Debug, Serialize)]
pub struct DeleteMemoryResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectionListResponse {
    pub connections: Vec<ConnectionInfo>,
}

fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

fn memory_service(state: &GatewayState) -> Result<&MemoryService, ApiError> {
    state
        .orchestrator
        .memory()
        .ok_or_else(|| ApiError::from(WadiError::Embedding("memory is disabled".into())))
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text format, or 404 when the exporter is disabled.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// POST /v1/projects/{project_id}/runs
///
/// Returns 201 with `{run, credits_used, credits_remaining}`.
pub async fn post_run(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
    Json(body): Json<RunBody>,
) -> Result<(StatusCode, Json<RunReceipt>), ApiError> {
    let model = body.model.clone();
    let receipt = state
        .orchestrator
        .create_run(RunRequest {
            user_id: identity.user_id,
            project_id,
            input: body.input,
            model: body.model,
        })
        .await
        .map_err(|e| ApiError::with_model(e, model))?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /v1/projects/{project_id}/runs?limit=
pub async fn list_runs(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RunListResponse>, ApiError> {
    let runs = state
        .orchestrator
        .list_runs(&identity.user_id, &project_id, query.limit)
        .await?;
    let total = state
        .orchestrator
        .count_runs(&identity.user_id, &project_id)
        .await?;
    Ok(Json(RunListResponse { runs, total }))
}

/// GET /v1/runs/{run_id}
pub async fn get_run(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(run_id): Path<String>,
) -> Result<Json<Run>, ApiError> {
    let run = state
        .orchestrator
        .get_run(&identity.user_id, &run_id)
        .await?;
    Ok(Json(run))
}

/// DELETE /v1/projects/{project_id}/session
///
/// Ends the caller's active session; the next run opens a fresh one.
pub async fn close_session(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
) -> Result<Json<CloseSessionResponse>, ApiError> {
    let closed = state
        .orchestrator
        .close_session(&identity.user_id, &project_id)
        .await?;
    Ok(Json(CloseSessionResponse { closed }))
}

/// GET /v1/credits
pub async fn get_balance(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .orchestrator
        .ledger()
        .get_balance(&identity.user_id)
        .await?;
    Ok(Json(BalanceResponse {
        user_id: identity.user_id,
        balance,
    }))
}

/// GET /v1/credits/history?limit=
pub async fn get_credit_history(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = clamp_limit(query.limit, DEFAULT_HISTORY_LIMIT);
    let entries = state
        .orchestrator
        .ledger()
        .history(&identity.user_id, limit)
        .await?;
    Ok(Json(HistoryResponse { entries }))
}

/// POST /v1/projects/{project_id}/memories
pub async fn post_memory(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
    Json(body): Json<StoreMemoryBody>,
) -> Result<(StatusCode, Json<StoreMemoryResponse>), ApiError> {
    let memory = memory_service(&state)?;
    if let Some(run_id) = &body.run_id {
        state
            .orchestrator
            .get_run(&identity.user_id, run_id)
            .await
            .map_err(|e| match e {
                WadiError::NotFound(_) => {
                    WadiError::InvalidInput(format!("unknown run_id `{run_id}`"))
                }
                other => other,
            })?;
    }
    let id = memory
        .store(
            &identity.user_id,
            &project_id,
            NewMemory {
                content: body.content,
                metadata: body.metadata,
                run_id: body.run_id,
                embedding: body.embedding,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(StoreMemoryResponse { id })))
}

/// POST /v1/projects/{project_id}/memories/search
pub async fn search_memories(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
    Json(body): Json<SearchMemoryBody>,
) -> Result<Json<SearchMemoryResponse>, ApiError> {
    let memory = memory_service(&state)?;
    let limit = clamp_limit(body.limit, DEFAULT_SEARCH_LIMIT);
    let results = memory
        .search(&identity.user_id, &project_id, &body.query, limit)
        .await?;
    Ok(Json(SearchMemoryResponse { results }))
}

/// DELETE /v1/projects/{project_id}/memories
pub async fn delete_memories(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(project_id): Path<String>,
) -> Result<Json<DeleteMemoryResponse>, ApiError> {
    let memory = memory_service(&state)?;
    let deleted = memory.clear_project(&identity.user_id, &project_id).await?;
    Ok(Json(DeleteMemoryResponse { deleted }))
}

/// GET /v1/connections
pub async fn get_connections(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Json<ConnectionListResponse> {
    let connections = state.registry.list_by_user(&identity.user_id).await;
    Json(ConnectionListResponse { connections })
}
