//! Match DTOs for accept, watch, and complete operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{HelpMatch, MatchId, MatchStatus, RequestId, UserId};

/// Request body for `POST /offers/{id}/accept`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptBody {
    /// Caller's user ID; must own the request the offer targets.
    pub requester_id: UserId,
}

/// A match as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDto {
    /// Match identifier. Clients carry this through navigation and use it
    /// to complete the session.
    pub id: MatchId,
    /// Request the match settles.
    pub request_id: RequestId,
    /// Accepted helper.
    pub helper_id: UserId,
    /// Requester.
    pub requester_id: UserId,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Session start timestamp.
    pub started_at: DateTime<Utc>,
    /// Session end timestamp, once done.
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<HelpMatch> for MatchDto {
    fn from(m: HelpMatch) -> Self {
        Self {
            id: m.id,
            request_id: m.request_id,
            helper_id: m.helper_id,
            requester_id: m.requester_id,
            status: m.status,
            started_at: m.started_at,
            ended_at: m.ended_at,
        }
    }
}

/// Response body for `POST /offers/{id}/accept`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptResponse {
    /// The match settling the request.
    pub data: MatchDto,
    /// `true` when the offer had already been accepted and the existing
    /// match was returned.
    pub already_accepted: bool,
}

/// Response body for `POST /matches/{id}/complete`.
///
/// `completed` is `false` when the other party finished first; both
/// outcomes are success for the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteResponse {
    /// Whether this caller performed the completion.
    pub completed: bool,
}
