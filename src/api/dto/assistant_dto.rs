//! Assistant DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /assistant/ask`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AskBody {
    /// The user's question.
    pub prompt: String,
}

/// Response body for `POST /assistant/ask`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AskResponse {
    /// The assistant's reply text.
    pub reply: String,
}
