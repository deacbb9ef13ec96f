//! Service layer: business logic orchestration.
//!
//! [`MatchService`] coordinates the request → offer → match lifecycle,
//! delegates state transitions to the [`crate::store::WorkflowStore`],
//! and emits events through the [`crate::domain::EventBus`].

pub mod match_service;

pub use match_service::MatchService;
