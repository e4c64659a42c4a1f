mod analysis;
mod config;
mod db;
mod errors;
mod generation;
mod job_search;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
mod storage;
mod workflow;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::db::{create_pool, ensure_kv_table};
use crate::llm_client::{GenerationBackend, LlmClient};
use crate::profile::store::ProfileStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{KeyValueStore, MemoryStore, PgStore, RedisStore};
use crate::workflow::controller::WorkflowController;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vantage API v{}", env!("CARGO_PKG_VERSION"));

    let kv = build_store(&config).await?;

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_max_retries)?;
    info!(
        "LLM client initialized (model: {}, retries: {})",
        llm_client::MODEL,
        config.llm_max_retries
    );
    let backend: Arc<dyn GenerationBackend> = Arc::new(llm);

    let profiles = ProfileStore::new(kv, &config.store_namespace);
    let controller =
        WorkflowController::load(backend, profiles, config.job_search_timeout).await;

    let state = AppState {
        controller: Arc::new(controller),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects the key-value substrate selected by `STORE_BACKEND`.
async fn build_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let pool = create_pool(url).await?;
            ensure_kv_table(&pool).await?;
            info!("PostgreSQL store initialized");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("REDIS_URL is required for the redis store")?;
            let client = redis::Client::open(url)?;
            info!("Redis store initialized");
            Ok(Arc::new(RedisStore::new(client)))
        }
        StoreBackend::Memory => {
            info!("In-memory store initialized (profile is not persisted across restarts)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
