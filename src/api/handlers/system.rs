//! System endpoints: health check and client poll configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::config::PollIntervals;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/poll-intervals` — Poll cadences for fallback clients.
#[utoipa::path(
    get,
    path = "/config/poll-intervals",
    tag = "System",
    summary = "Get poll intervals",
    description = "Returns the refetch cadences interval-polling clients should use for each watch: acceptance, offers, and the request board. Clients with a WebSocket subscription ignore these.",
    responses(
        (status = 200, description = "Poll cadences in milliseconds", body = PollIntervals),
    )
)]
pub async fn poll_intervals_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.poll_intervals))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/poll-intervals", get(poll_intervals_handler))
}
