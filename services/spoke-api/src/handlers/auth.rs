//! SSO token exchange

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use spoke_types::Subscription;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SsoLoginRequest {
    /// SSO assertion minted by the Hub
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SsoLoginResponse {
    pub principal: PrincipalInfo,
}

#[derive(Debug, Serialize)]
pub struct PrincipalInfo {
    pub id: String,
    pub hub_user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub subscriptions: Vec<Subscription>,
}

/// POST /api/v1/auth/sso
///
/// Validate a Hub SSO assertion and bind it to a local principal. A
/// rejected assertion comes back as 401 with the precise reason code.
pub async fn sso_login(
    State(state): State<AppState>,
    Json(req): Json<SsoLoginRequest>,
) -> ApiResult<Json<SsoLoginResponse>> {
    let principal = state.sso.login(&req.token).await?;

    tracing::debug!(principal_id = %principal.id, "SSO login");

    Ok(Json(SsoLoginResponse {
        principal: PrincipalInfo {
            id: principal.id.to_string(),
            hub_user_id: principal.hub_user_id,
            username: principal.username,
            email: principal.email,
            subscriptions: principal.subscriptions,
        },
    }))
}
