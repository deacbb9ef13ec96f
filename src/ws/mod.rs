//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` is the push half of the observer
//! contract: clients subscribe to request IDs and receive every
//! [`crate::domain::MatchEvent`] touching them, instead of re-reading
//! shared state on a timer.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
