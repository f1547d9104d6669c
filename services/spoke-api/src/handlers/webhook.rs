//! Hub webhook endpoint

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Signature header the Hub sends with each delivery
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// POST /api/v1/hub/webhook
///
/// Signature verification happens over the raw body, so this handler
/// takes `Bytes` rather than a typed JSON extractor.
pub async fn hub_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing signature header".to_string()))?;

    state.sso.handle_webhook(&body, signature).await?;

    Ok(Json(WebhookResponse { received: true }))
}
