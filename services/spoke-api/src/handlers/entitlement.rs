//! Entitlement checks

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use spoke_types::PrincipalId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub principal_id: String,
    /// Comma-separated product IDs; empty or absent means no requirement
    #[serde(default)]
    pub products: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub entitled: bool,
    pub products: Vec<String>,
}

/// GET /api/v1/entitlements/check?principal_id=...&products=a,b
pub async fn check_entitlement(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> ApiResult<Json<CheckResponse>> {
    let principal_id = PrincipalId::parse(&query.principal_id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid principal_id: {}", query.principal_id)))?;

    let products: Vec<String> = query
        .products
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    let entitled = state.sso.has_entitlement(&principal_id, &products).await;

    Ok(Json(CheckResponse { entitled, products }))
}
