//! Assistant handler: the single `ask` operation.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AskBody, AskResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /assistant/ask` — Ask the chat assistant one question.
///
/// # Errors
///
/// Returns [`WorkflowError::Assistant`] when the upstream call fails; the
/// message is suitable for inline display.
#[utoipa::path(
    post,
    path = "/api/v1/assistant/ask",
    tag = "Assistant",
    summary = "Ask the assistant",
    description = "Forwards one prompt to the chat-completion endpoint and returns the reply text. Upstream failures come back as a single descriptive error string; there is no retry.",
    request_body = AskBody,
    responses(
        (status = 200, description = "Assistant reply", body = AskResponse),
        (status = 400, description = "Empty prompt", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse),
    )
)]
pub async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<impl IntoResponse, WorkflowError> {
    let reply = state.assistant.ask(&body.prompt).await?;
    Ok(Json(AskResponse { reply }))
}

/// Assistant routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/assistant/ask", post(ask))
}
