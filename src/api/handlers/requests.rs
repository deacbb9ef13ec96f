//! Help-request handlers: create, board listing, get, withdraw.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    BoardParams, BoardResponse, CreateRequestBody, RequestDto, WithdrawParams,
};
use crate::app_state::AppState;
use crate::domain::{RequestFields, RequestId, UserId};
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /requests` — Submit a new help request.
///
/// # Errors
///
/// Returns [`WorkflowError`] on missing requester or empty fields.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "Requests",
    summary = "Submit a help request",
    description = "Creates a pending help request visible on the helper board. The requester is routed to the waiting view and polls (or subscribes) for incoming offers.",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request created", body = RequestDto),
        (status = 400, description = "Missing requester or empty fields", body = ErrorResponse),
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<impl IntoResponse, WorkflowError> {
    let fields = RequestFields {
        first_name: body.first_name,
        last_name: body.last_name,
        difficulty_type: body.difficulty_type,
        floor: body.floor,
        description: body.description,
    };
    let request = state
        .match_service
        .create_request(body.requester_id, fields)
        .await?;

    Ok((StatusCode::CREATED, Json(RequestDto::from(request))))
}

/// `GET /requests` — The open request board.
///
/// # Errors
///
/// Returns [`WorkflowError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    tag = "Requests",
    summary = "List open requests",
    description = "Returns pending requests newest first, excluding those posted by the calling user. Matched requests are never listed.",
    params(BoardParams),
    responses(
        (status = 200, description = "Open request board", body = BoardResponse),
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<BoardParams>,
) -> Result<impl IntoResponse, WorkflowError> {
    let excluding = UserId::from_uuid(params.exclude);
    let requests = state.match_service.open_board(excluding).await?;
    Ok(Json(BoardResponse {
        data: requests.into_iter().map(RequestDto::from).collect(),
    }))
}

/// `GET /requests/{id}` — Get a single request.
///
/// # Errors
///
/// Returns [`WorkflowError::RequestNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    summary = "Get request details",
    description = "Returns one request, including the floor and description a matched helper needs to show up.",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
    ),
    responses(
        (status = 200, description = "Request details", body = RequestDto),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WorkflowError> {
    let request = state
        .match_service
        .get_request(RequestId::from_uuid(id))
        .await?;
    Ok(Json(RequestDto::from(request)))
}

/// `DELETE /requests/{id}` — Withdraw a pending request.
///
/// # Errors
///
/// Returns [`WorkflowError`] if the request is missing, already matched,
/// or not owned by the caller.
#[utoipa::path(
    delete,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    summary = "Withdraw a request",
    description = "Deletes a pending request and retires its offers. Only the requester may withdraw, and only before an offer is accepted.",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
        WithdrawParams,
    ),
    responses(
        (status = 204, description = "Request withdrawn"),
        (status = 403, description = "Caller does not own the request", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already matched", body = ErrorResponse),
    )
)]
pub async fn withdraw_request(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<WithdrawParams>,
) -> Result<impl IntoResponse, WorkflowError> {
    state
        .match_service
        .withdraw_request(
            RequestId::from_uuid(id),
            UserId::from_uuid(params.requester_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", axum::routing::post(create_request).get(list_requests))
        .route(
            "/requests/{id}",
            get(get_request).delete(withdraw_request),
        )
}
