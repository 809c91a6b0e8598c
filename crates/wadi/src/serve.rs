// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wadi serve`: wire storage, ledger, provider, memory and transports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wadi_config::WadiConfig;
use wadi_core::WadiError;
use wadi_credits::CreditLedger;
use wadi_gateway::{
    start_server, GatewayState, HealthState, InMemoryConnectionRegistry, ServerConfig,
    StaticTokenAuth, WsSettings,
};
use wadi_memory::{MemoryService, MemoryStore};
use wadi_openai::{OpenAiEmbedder, OpenAiProvider};
use wadi_orchestrator::{OrchestratorOptions, RunOrchestrator};
use wadi_prometheus::PrometheusExporter;
use wadi_storage::Database;

use crate::shutdown;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wadi={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Build every subsystem from `config` and serve until a shutdown signal.
pub async fn run_serve(config: WadiConfig) -> Result<(), WadiError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting");

    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let ledger = CreditLedger::from_database(&db);
    let provider = Arc::new(OpenAiProvider::new(&config.provider)?);

    let options = OrchestratorOptions {
        context_max_tokens: config.memory.context_max_tokens,
        record_runs: config.memory.record_runs,
        max_tokens: Some(config.provider.max_tokens),
    };
    let mut orchestrator = RunOrchestrator::new(db.clone(), ledger, provider, options);

    if config.memory.enabled {
        let embedder = OpenAiEmbedder::new(&config.embedding)?;
        if !embedder.is_configured() {
            warn!("memory enabled without an embedding API key; context retrieval will be skipped");
        }
        let memory = MemoryService::new(MemoryStore::from_database(&db), Arc::new(embedder));
        orchestrator = orchestrator.with_memory(memory);
    } else {
        info!("vector memory disabled");
    }

    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.prometheus.enabled {
            let exporter = PrometheusExporter::install()?;
            Some(Arc::new(move || exporter.render()))
        } else {
            None
        };

    let auth = StaticTokenAuth::new(config.gateway.tokens.clone());
    if auth.is_empty() {
        warn!("no gateway tokens configured; every authenticated request will be rejected");
    }

    let state = GatewayState {
        orchestrator,
        auth: Arc::new(auth),
        registry: Arc::new(InMemoryConnectionRegistry::new()),
        ws: WsSettings {
            heartbeat_interval: Duration::from_secs(config.gateway.heartbeat_interval_secs),
            auth_timeout: Duration::from_secs(config.gateway.auth_timeout_secs),
        },
        health: HealthState {
            start_time: Instant::now(),
            prometheus_render,
        },
    };

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let shutdown = shutdown::install_signal_handler();

    start_server(&server_config, state, shutdown).await?;
    info!("shutdown complete");
    Ok(())
}
