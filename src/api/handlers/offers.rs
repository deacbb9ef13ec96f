//! Helper-offer handlers: propose, list, and the helper-side watch query.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    LatestOfferParams, OfferDto, OfferListResponse, ProposeBody, ProposeResponse,
};
use crate::app_state::AppState;
use crate::domain::{RequestId, UserId};
use crate::error::{ErrorResponse, WorkflowError};
use crate::store::ProposeOutcome;

/// `POST /requests/{id}/offers` — Volunteer for a request.
///
/// # Errors
///
/// Returns [`WorkflowError`] if the request is missing or no longer open.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/offers",
    tag = "Offers",
    summary = "Volunteer to help",
    description = "Creates a pending offer for the request. Idempotent: repeating the call returns the existing offer with `already_proposed` set, so the client can route straight to the waiting view.",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
    ),
    request_body = ProposeBody,
    responses(
        (status = 201, description = "Offer created (or pre-existing)", body = ProposeResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request no longer open", body = ErrorResponse),
    )
)]
pub async fn propose_help(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<ProposeBody>,
) -> Result<impl IntoResponse, WorkflowError> {
    let outcome = state
        .match_service
        .propose_help(RequestId::from_uuid(id), body.helper_id)
        .await?;

    let already_proposed = matches!(outcome, ProposeOutcome::AlreadyProposed(_));
    let response = ProposeResponse {
        offer: OfferDto::from(outcome.offer().clone()),
        already_proposed,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /requests/{id}/offers` — Offers a request has received.
///
/// # Errors
///
/// Returns [`WorkflowError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/offers",
    tag = "Offers",
    summary = "List offers for a request",
    description = "The requester's watch query: returns every offer targeting the request, oldest first. Polled while waiting for helpers.",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
    ),
    responses(
        (status = 200, description = "Offers for the request", body = OfferListResponse),
    )
)]
pub async fn list_offers(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WorkflowError> {
    let offers = state
        .match_service
        .offers_for_request(RequestId::from_uuid(id))
        .await?;
    Ok(Json(OfferListResponse {
        data: offers.into_iter().map(OfferDto::from).collect(),
    }))
}

/// `GET /offers/latest` — A helper's most recent offer.
///
/// # Errors
///
/// Returns [`WorkflowError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/offers/latest",
    tag = "Offers",
    summary = "Get a helper's latest offer",
    description = "The helper's watch query: returns their most recent offer so the waiting view can detect the flip to accepted. 200 with no body fields means no offer yet.",
    params(LatestOfferParams),
    responses(
        (status = 200, description = "Latest offer, or null", body = Option<OfferDto>),
    )
)]
pub async fn latest_offer(
    State(state): State<AppState>,
    Query(params): Query<LatestOfferParams>,
) -> Result<impl IntoResponse, WorkflowError> {
    let offer = state
        .match_service
        .latest_offer(UserId::from_uuid(params.helper_id))
        .await?;
    Ok(Json(offer.map(OfferDto::from)))
}

/// Offer lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/requests/{id}/offers",
            axum::routing::post(propose_help).get(list_offers),
        )
        .route("/offers/latest", get(latest_offer))
}
