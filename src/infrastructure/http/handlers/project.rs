//! Project Handlers
//!
//! 作品由客户端持有：统计、快照与节奏预览都是纯计算，不落库

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::queries::{PacingPreview, SnapshotSummary};
use crate::application::{
    CreateSnapshot, DeleteSnapshot, GetProjectStats, ListSnapshots, PreviewPacing,
    RestoreSnapshot,
};
use crate::domain::assistant::AiSettings;
use crate::domain::project::{Project, ProjectMetadata};
use crate::infrastructure::http::dto::{ApiResponse, ProjectRequest, SnapshotRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 字数、章节数与内容哈希
pub async fn project_stats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<ApiResponse<ProjectMetadata>>, ApiError> {
    let metadata = state
        .get_project_stats_handler
        .handle(GetProjectStats {
            project: req.project,
        })?;
    Ok(Json(ApiResponse::success(metadata)))
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSnapshotRequest {
    pub project: Project,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotResponseDto {
    pub snapshot_id: String,
    pub project: Project,
}

pub async fn create_snapshot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSnapshotRequest>,
) -> Result<Json<ApiResponse<CreateSnapshotResponseDto>>, ApiError> {
    let result = state.create_snapshot_handler.handle(CreateSnapshot {
        project: req.project,
        note: req.note,
    })?;

    Ok(Json(ApiResponse::success(CreateSnapshotResponseDto {
        snapshot_id: result.snapshot_id,
        project: result.project,
    })))
}

pub async fn restore_snapshot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let project = state.restore_snapshot_handler.handle(RestoreSnapshot {
        project: req.project,
        snapshot_id: req.snapshot_id,
    })?;
    Ok(Json(ApiResponse::success(project)))
}

pub async fn delete_snapshot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let project = state.delete_snapshot_handler.handle(DeleteSnapshot {
        project: req.project,
        snapshot_id: req.snapshot_id,
    })?;
    Ok(Json(ApiResponse::success(project)))
}

#[derive(Debug, Serialize)]
pub struct SnapshotListResponse {
    pub snapshots: Vec<SnapshotSummary>,
}

/// 新到旧
pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<ApiResponse<SnapshotListResponse>>, ApiError> {
    let snapshots = state.list_snapshots_handler.handle(ListSnapshots {
        project: req.project,
    });
    Ok(Json(ApiResponse::success(SnapshotListResponse { snapshots })))
}

// ============================================================================
// Pacing
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingRequest {
    #[serde(default)]
    pub settings: AiSettings,
    pub current_words: u32,
    pub current_scenes: u32,
}

pub async fn preview_pacing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PacingRequest>,
) -> Result<Json<ApiResponse<PacingPreview>>, ApiError> {
    let preview = state.preview_pacing_handler.handle(PreviewPacing {
        settings: req.settings,
        current_words: req.current_words,
        current_scenes: req.current_scenes,
    });
    Ok(Json(ApiResponse::success(preview)))
}
