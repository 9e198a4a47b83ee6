//! Identity Handlers
//!
//! 请求头 `x-owner-id` 优先于本地保存的所有者 id

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub const OWNER_HEADER: &str = "x-owner-id";

/// 当前请求的所有者 id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OwnerId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        Ok(match header {
            Some(id) => OwnerId(id.to_string()),
            None => OwnerId(state.identity.owner_id()),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub owner_id: String,
}

pub async fn get_identity(OwnerId(owner_id): OwnerId) -> Json<ApiResponse<IdentityResponse>> {
    Json(ApiResponse::success(IdentityResponse { owner_id }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIdentityRequest {
    pub owner_id: String,
}

/// 手动指定所有者 id（跨设备同步）
pub async fn set_identity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetIdentityRequest>,
) -> Result<Json<ApiResponse<IdentityResponse>>, ApiError> {
    state.identity.set_owner_id(&req.owner_id)?;

    Ok(Json(ApiResponse::success(IdentityResponse {
        owner_id: state.identity.owner_id(),
    })))
}
