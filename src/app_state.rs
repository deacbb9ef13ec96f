//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::assistant::AssistantClient;
use crate::config::PollIntervals;
use crate::domain::EventBus;
use crate::service::MatchService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Match service for all workflow logic.
    pub match_service: Arc<MatchService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Chat-assistant client.
    pub assistant: Arc<AssistantClient>,
    /// Poll cadences advertised to interval-polling clients.
    pub poll_intervals: PollIntervals,
}
