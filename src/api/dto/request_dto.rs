//! Help-request DTOs for create, board, and withdraw operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{HelpRequest, RequestId, RequestStatus, UserId};

/// Request body for `POST /requests`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequestBody {
    /// User submitting the request.
    pub requester_id: UserId,
    /// Requester first name.
    pub first_name: String,
    /// Requester last name.
    pub last_name: String,
    /// Kind of difficulty.
    pub difficulty_type: String,
    /// Where to meet (floor / room), if given.
    #[serde(default)]
    pub floor: Option<String>,
    /// Free-text description of the situation.
    pub description: String,
}

/// A help request as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestDto {
    /// Request identifier.
    pub id: RequestId,
    /// User who submitted it.
    pub requester_id: UserId,
    /// Lifecycle status.
    pub status: RequestStatus,
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
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<HelpRequest> for RequestDto {
    fn from(r: HelpRequest) -> Self {
        Self {
            id: r.id,
            requester_id: r.requester_id,
            status: r.status,
            first_name: r.first_name,
            last_name: r.last_name,
            difficulty_type: r.difficulty_type,
            floor: r.floor,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

/// Query parameters for `GET /requests`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BoardParams {
    /// Caller's user ID; their own requests are excluded from the board.
    pub exclude: uuid::Uuid,
}

/// Response body for `GET /requests`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardResponse {
    /// Pending requests, newest first.
    pub data: Vec<RequestDto>,
}

/// Query parameters for `DELETE /requests/{id}`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WithdrawParams {
    /// Caller's user ID; must own the request.
    pub requester_id: uuid::Uuid,
}
