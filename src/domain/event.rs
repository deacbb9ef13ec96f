//! Domain events reflecting workflow state transitions.
//!
//! Every state mutation emits a [`MatchEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers so
//! that peers can react to transitions without re-reading the store;
//! interval polling remains available as a fallback for clients without a
//! socket.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{MatchId, OfferId, RequestId, UserId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A new help request was posted to the board.
    RequestOpened {
        /// Request identifier.
        request_id: RequestId,
        /// User who posted it.
        requester_id: UserId,
        /// Kind of difficulty.
        difficulty_type: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pending request was withdrawn by its requester.
    RequestWithdrawn {
        /// Request identifier.
        request_id: RequestId,
        /// Withdrawal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A helper volunteered for a request.
    OfferProposed {
        /// Target request.
        request_id: RequestId,
        /// Offer identifier.
        offer_id: OfferId,
        /// Volunteering helper.
        helper_id: UserId,
        /// Proposal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The requester accepted an offer; a waiting match now exists.
    MatchStarted {
        /// Settled request.
        request_id: RequestId,
        /// Accepted offer.
        offer_id: OfferId,
        /// Match identifier.
        match_id: MatchId,
        /// Accepted helper.
        helper_id: UserId,
        /// Accepting requester.
        requester_id: UserId,
        /// Acceptance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Either party finished the session; the match and its request are
    /// being retired.
    MatchCompleted {
        /// Settled request.
        request_id: RequestId,
        /// Completed match.
        match_id: MatchId,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl MatchEvent {
    /// Returns the request ID associated with this event.
    ///
    /// Every event in the lifecycle concerns exactly one request, which is
    /// what WebSocket subscriptions filter on.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::RequestOpened { request_id, .. }
            | Self::RequestWithdrawn { request_id, .. }
            | Self::OfferProposed { request_id, .. }
            | Self::MatchStarted { request_id, .. }
            | Self::MatchCompleted { request_id, .. } => *request_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::RequestOpened { .. } => "request_opened",
            Self::RequestWithdrawn { .. } => "request_withdrawn",
            Self::OfferProposed { .. } => "offer_proposed",
            Self::MatchStarted { .. } => "match_started",
            Self::MatchCompleted { .. } => "match_completed",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn request_opened_event_type() {
        let event = MatchEvent::RequestOpened {
            request_id: RequestId::new(),
            requester_id: UserId::new(),
            difficulty_type: "math".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "request_opened");
    }

    #[test]
    fn match_started_serializes() {
        let event = MatchEvent::MatchStarted {
            request_id: RequestId::new(),
            offer_id: OfferId::new(),
            match_id: MatchId::new(),
            helper_id: UserId::new(),
            requester_id: UserId::new(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event);
        assert!(json.is_ok());
        let json_str = json.unwrap_or_default();
        assert!(json_str.contains("match_started"));
        assert!(json_str.contains("helper_id"));
    }

    #[test]
    fn request_id_accessor() {
        let id = RequestId::new();
        let event = MatchEvent::RequestWithdrawn {
            request_id: id,
            timestamp: Utc::now(),
        };
        assert_eq!(event.request_id(), id);
    }
}
