//! Helper-offer DTOs for propose and watch operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{HelperOffer, OfferId, OfferStatus, RequestId, UserId};

/// Request body for `POST /requests/{id}/offers`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProposeBody {
    /// User volunteering to help.
    pub helper_id: UserId,
}

/// A helper offer as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferDto {
    /// Offer identifier.
    pub id: OfferId,
    /// Request the offer targets.
    pub request_id: RequestId,
    /// Volunteering helper.
    pub helper_id: UserId,
    /// Lifecycle status.
    pub status: OfferStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<HelperOffer> for OfferDto {
    fn from(o: HelperOffer) -> Self {
        Self {
            id: o.id,
            request_id: o.request_id,
            helper_id: o.helper_id,
            status: o.status,
            created_at: o.created_at,
        }
    }
}

/// Response body for `POST /requests/{id}/offers`.
///
/// `already_proposed` distinguishes the idempotent repeat from a fresh
/// proposal; clients route to the waiting view either way.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProposeResponse {
    /// The offer (fresh or pre-existing).
    pub offer: OfferDto,
    /// `true` when the helper had already volunteered for this request.
    pub already_proposed: bool,
}

/// Response body for `GET /requests/{id}/offers`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferListResponse {
    /// Offers targeting the request, oldest first.
    pub data: Vec<OfferDto>,
}

/// Query parameters for `GET /offers/latest`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LatestOfferParams {
    /// Helper whose most recent offer is requested.
    pub helper_id: uuid::Uuid,
}
