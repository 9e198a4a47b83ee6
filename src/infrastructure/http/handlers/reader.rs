//! Reader Handlers - 分页与 Codex 高亮

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::queries::PaginateResponse;
use crate::application::{HighlightCodex, PaginateText};
use crate::domain::project::CodexEntry;
use crate::domain::reader::{HighlightSpan, PageLayout};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaginateRequest {
    pub text: String,
    /// 缺省时使用服务端配置的版式
    #[serde(default)]
    pub layout: Option<PageLayout>,
}

pub async fn paginate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaginateRequest>,
) -> Result<Json<ApiResponse<PaginateResponse>>, ApiError> {
    let response = state.paginate_text_handler.handle(PaginateText {
        text: req.text,
        layout: req.layout,
    })?;
    Ok(Json(ApiResponse::success(response)))
}

#[derive(Debug, Deserialize)]
pub struct HighlightRequest {
    pub text: String,
    #[serde(default)]
    pub codex: Vec<CodexEntry>,
}

#[derive(Debug, Serialize)]
pub struct HighlightResponse {
    pub spans: Vec<HighlightSpan>,
}

pub async fn highlight(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HighlightRequest>,
) -> Result<Json<ApiResponse<HighlightResponse>>, ApiError> {
    let spans = state.highlight_codex_handler.handle(HighlightCodex {
        text: req.text,
        codex: req.codex,
    });
    Ok(Json(ApiResponse::success(HighlightResponse { spans })))
}
