//! Domain layer: entity schemas, identifiers, and the event system.
//!
//! This module contains the server-side domain model for the matching
//! workflow: typed identifiers, the three entity schemas with explicit
//! status columns, the change events emitted on every transition, and the
//! broadcast bus carrying them to subscribers.

pub mod entities;
pub mod event;
pub mod event_bus;
pub mod ids;

pub use entities::{
    HelpMatch, HelpRequest, HelperOffer, MatchStatus, OfferStatus, RequestFields, RequestStatus,
};
pub use event::MatchEvent;
pub use event_bus::EventBus;
pub use ids::{MatchId, OfferId, RequestId, UserId};
