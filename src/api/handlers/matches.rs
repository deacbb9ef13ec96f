//! Match handlers: accept, watch queries for both sides, complete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AcceptBody, AcceptResponse, CompleteResponse, MatchDto};
use crate::app_state::AppState;
use crate::domain::{MatchId, OfferId, RequestId, UserId};
use crate::error::{ErrorResponse, WorkflowError};
use crate::store::{AcceptOutcome, CompletionOutcome};

/// `POST /offers/{id}/accept` — Accept an offer, creating the match.
///
/// # Errors
///
/// Returns [`WorkflowError`] if the offer is missing, the caller does not
/// own the request, or a concurrent accept already claimed it.
#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/accept",
    tag = "Matches",
    summary = "Accept an offer",
    description = "The authority transition: claims the request, marks the offer accepted, and creates the waiting match — atomically. A concurrent accept of a different offer for the same request gets 409. Re-accepting the same offer returns the existing match.",
    params(
        ("id" = uuid::Uuid, Path, description = "Offer UUID"),
    ),
    request_body = AcceptBody,
    responses(
        (status = 201, description = "Match created (or pre-existing)", body = AcceptResponse),
        (status = 403, description = "Caller does not own the request", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
        (status = 409, description = "Request already claimed", body = ErrorResponse),
    )
)]
pub async fn accept_offer(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<AcceptBody>,
) -> Result<impl IntoResponse, WorkflowError> {
    let outcome = state
        .match_service
        .accept_offer(OfferId::from_uuid(id), body.requester_id)
        .await?;

    let already_accepted = matches!(outcome, AcceptOutcome::AlreadyAccepted(_));
    let response = AcceptResponse {
        data: MatchDto::from(outcome.help_match().clone()),
        already_accepted,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /matches/for-request/{id}` — The match settling a request.
///
/// # Errors
///
/// Returns [`WorkflowError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/matches/for-request/{id}",
    tag = "Matches",
    summary = "Get the match for a request",
    description = "The requester's watch query: once this returns a match, the requester navigates to the in-session screen carrying the match ID.",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
    ),
    responses(
        (status = 200, description = "Match, or null when none exists", body = Option<MatchDto>),
    )
)]
pub async fn match_for_request(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WorkflowError> {
    let found = state
        .match_service
        .match_for_request(RequestId::from_uuid(id))
        .await?;
    Ok(Json(found.map(MatchDto::from)))
}

/// `GET /matches/for-helper/{id}` — A helper's current match.
///
/// # Errors
///
/// Returns [`WorkflowError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/matches/for-helper/{id}",
    tag = "Matches",
    summary = "Get a helper's current match",
    description = "The helper's watch query: once this returns a match, the helper's offer was accepted and the session screen opens with the match ID.",
    params(
        ("id" = uuid::Uuid, Path, description = "Helper user UUID"),
    ),
    responses(
        (status = 200, description = "Match, or null when none exists", body = Option<MatchDto>),
    )
)]
pub async fn match_for_helper(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WorkflowError> {
    let found = state
        .match_service
        .match_for_helper(UserId::from_uuid(id))
        .await?;
    Ok(Json(found.map(MatchDto::from)))
}

/// `POST /matches/{id}/complete` — Finish a session from either side.
///
/// # Errors
///
/// Returns [`WorkflowError`] only on store failure; completing an
/// already-completed match is a successful no-op.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/complete",
    tag = "Matches",
    summary = "Complete a match",
    description = "Marks the match done and retires its rows. When both parties finish within the same poll window, the second caller gets `completed: false` — success, nothing left to do.",
    params(
        ("id" = uuid::Uuid, Path, description = "Match UUID"),
    ),
    responses(
        (status = 200, description = "Completion outcome", body = CompleteResponse),
    )
)]
pub async fn complete_match(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WorkflowError> {
    let outcome = state
        .match_service
        .complete_match(MatchId::from_uuid(id))
        .await?;
    Ok(Json(CompleteResponse {
        completed: matches!(outcome, CompletionOutcome::Completed(_)),
    }))
}

/// Match lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/offers/{id}/accept", post(accept_offer))
        .route("/matches/for-request/{id}", get(match_for_request))
        .route("/matches/for-helper/{id}", get(match_for_helper))
        .route("/matches/{id}/complete", post(complete_match))
}
