//! Chat message relay endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use spoke_store::PrincipalRepository;
use spoke_types::{ChatMessage, PrincipalId, MAX_MESSAGE_LEN};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub principal_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<ChatMessage>,
}

/// POST /api/v1/chat/messages
///
/// Validation mirrors the relay's contract: non-empty after trim, at
/// most 500 characters. The author must be a known principal.
pub async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<PostMessageResponse>)> {
    let principal_id = PrincipalId::parse(&req.principal_id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid principal_id: {}", req.principal_id)))?;

    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Message is empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Message exceeds {MAX_MESSAGE_LEN} characters"
        )));
    }

    let principal = state
        .principals
        .find_by_id(principal_id.0)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;

    let message = ChatMessage::new(principal_id, principal.username, text);
    state.relay.post(message.clone());

    Ok((StatusCode::CREATED, Json(PostMessageResponse { message })))
}

/// GET /api/v1/chat/messages
///
/// The retained backlog, oldest first.
pub async fn list_messages(State(state): State<AppState>) -> Json<ListMessagesResponse> {
    Json(ListMessagesResponse {
        messages: state.relay.messages(),
    })
}
