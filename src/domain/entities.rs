//! Typed entity schemas for the matching workflow.
//!
//! All three entities carry explicit status columns; no state is inferred
//! from the presence or absence of rows elsewhere. Statuses are encoded as
//! lowercase strings in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{MatchId, OfferId, RequestId, UserId};

/// Lifecycle state of a help request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Visible on the helper board, accepting offers.
    Pending,
    /// Claimed by an accepted offer; no longer listed to helpers.
    Matched,
}

/// Lifecycle state of a helper offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Waiting for the requester's decision.
    Pending,
    /// Chosen by the requester; a match exists for this offer.
    Accepted,
}

/// Lifecycle state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Session in progress; neither party has finished yet.
    Waiting,
    /// Finished by either party. The row is deleted shortly after.
    Done,
}

impl RequestStatus {
    /// Returns the store encoding of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
        }
    }

    /// Parses the store encoding.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "matched" => Some(Self::Matched),
            _ => None,
        }
    }
}

impl OfferStatus {
    /// Returns the store encoding of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }

    /// Parses the store encoding.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }
}

impl MatchStatus {
    /// Returns the store encoding of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Done => "done",
        }
    }

    /// Parses the store encoding.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// A help request submitted by a student.
///
/// Created `pending`, flipped to `matched` when an offer is accepted, and
/// deleted when the match completes (or the requester cancels).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HelpRequest {
    /// Request identifier.
    pub id: RequestId,
    /// User who submitted the request.
    pub requester_id: UserId,
    /// Lifecycle status.
    pub status: RequestStatus,
    /// Requester first name as entered in the form.
    pub first_name: String,
    /// Requester last name as entered in the form.
    pub last_name: String,
    /// Kind of difficulty (free text category).
    pub difficulty_type: String,
    /// Where to meet (floor / room), if given.
    pub floor: Option<String>,
    /// Free-text description of the situation.
    pub description: String,
    /// Creation timestamp; the board orders newest first on this.
    pub created_at: DateTime<Utc>,
}

/// Descriptive fields for a new help request.
#[derive(Debug, Clone)]
pub struct RequestFields {
    /// Requester first name.
    pub first_name: String,
    /// Requester last name.
    pub last_name: String,
    /// Kind of difficulty.
    pub difficulty_type: String,
    /// Where to meet, if given.
    pub floor: Option<String>,
    /// Free-text description.
    pub description: String,
}

/// A helper's offer to fulfill a specific request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HelperOffer {
    /// Offer identifier.
    pub id: OfferId,
    /// Request the offer targets.
    pub request_id: RequestId,
    /// User offering to help.
    pub helper_id: UserId,
    /// Lifecycle status.
    pub status: OfferStatus,
    /// Creation timestamp; "latest offer" queries order on this.
    pub created_at: DateTime<Utc>,
}

/// The paired session created when an offer is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HelpMatch {
    /// Match identifier.
    pub id: MatchId,
    /// Request the match settles. At most one match exists per request.
    pub request_id: RequestId,
    /// The accepted helper.
    pub helper_id: UserId,
    /// The requester.
    pub requester_id: UserId,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    /// When either party finished, if done.
    pub ended_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_encodings_round_trip() {
        for status in [RequestStatus::Pending, RequestStatus::Matched] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        for status in [OfferStatus::Pending, OfferStatus::Accepted] {
            assert_eq!(OfferStatus::parse(status.as_str()), Some(status));
        }
        for status in [MatchStatus::Waiting, MatchStatus::Done] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert_eq!(RequestStatus::parse("done"), None);
        assert_eq!(OfferStatus::parse(""), None);
        assert_eq!(MatchStatus::parse("WAITING"), None);
    }

    #[test]
    fn statuses_serialize_snake_case() {
        let json = serde_json::to_string(&MatchStatus::Waiting).ok();
        assert_eq!(json.as_deref(), Some("\"waiting\""));
    }
}
