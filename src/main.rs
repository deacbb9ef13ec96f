//! peermatch-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use peermatch_gateway::api;
use peermatch_gateway::app_state::AppState;
use peermatch_gateway::assistant::AssistantClient;
use peermatch_gateway::config::ServiceConfig;
use peermatch_gateway::domain::EventBus;
use peermatch_gateway::service::MatchService;
use peermatch_gateway::store::{MemoryStore, PostgresStore, WorkflowStore};
use peermatch_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServiceConfig::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(addr = %config.listen_addr, "starting peermatch-gateway");

    // Build the store: Postgres when persistence is enabled, otherwise the
    // in-memory store (state does not survive a restart).
    let store: Arc<dyn WorkflowStore> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .context("connecting to postgres")?;
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("running migrations")?;
        tracing::info!("postgres store ready");
        Arc::new(PostgresStore::new(pool))
    } else {
        tracing::warn!("persistence disabled; using in-memory store");
        Arc::new(MemoryStore::new())
    };

    // Build domain and service layers
    let event_bus = EventBus::new(config.event_bus_capacity);
    let match_service = Arc::new(MatchService::new(store, event_bus.clone()));
    let assistant = Arc::new(AssistantClient::from_config(&config)?);

    // Build application state
    let app_state = AppState {
        match_service,
        event_bus,
        assistant,
        poll_intervals: config.poll_intervals,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
