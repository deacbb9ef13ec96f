//! REST endpoint handlers organized by resource.

pub mod assistant;
pub mod matches;
pub mod offers;
pub mod requests;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(requests::routes())
        .merge(offers::routes())
        .merge(matches::routes())
        .merge(assistant::routes())
}
