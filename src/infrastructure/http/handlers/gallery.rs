//! Gallery Handlers
//!
//! 无状态分页、阅读、发布、点赞与导入

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::queries::{GalleryConnectionStatus, GalleryPageResponse};
use crate::application::{
    GetGalleryPage, ImportNovel, LikeNovel, PublishNovel, ReadGalleryNovel,
    TestGalleryConnection,
};
use crate::domain::gallery::{FeedSnapshot, GalleryFilter, Visibility};
use crate::domain::project::Project;
use crate::infrastructure::http::dto::{ApiResponse, NovelIdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::handlers::identity::OwnerId;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Page / Status / Read
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GalleryPageRequest {
    #[serde(flatten)]
    pub filter: GalleryFilter,
    pub page: usize,
    pub limit: Option<usize>,
}

pub async fn gallery_page(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<GalleryPageRequest>,
) -> Result<Json<ApiResponse<GalleryPageResponse>>, ApiError> {
    let response = state
        .get_gallery_page_handler
        .handle(GetGalleryPage {
            filter: req.filter,
            page: req.page,
            limit: req.limit,
            owner_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 连接测试失败时 errno 仍为 0，失败原因放在 data.error
pub async fn gallery_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<GalleryConnectionStatus>> {
    let status = state
        .test_gallery_connection_handler
        .handle(TestGalleryConnection)
        .await;
    Json(ApiResponse::success(status))
}

/// 在线阅读，不计下载
pub async fn read_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let project = state
        .read_gallery_novel_handler
        .handle(ReadGalleryNovel {
            novel_id: req.novel_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

// ============================================================================
// Publish
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub project: Project,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponseDto {
    pub novel_id: String,
    pub content_hash: String,
    pub visibility: Visibility,
    pub created: bool,
}

pub async fn publish_novel(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<PublishRequest>,
) -> Result<Json<ApiResponse<PublishResponseDto>>, ApiError> {
    let result = state
        .publish_novel_handler
        .handle(PublishNovel {
            project: req.project,
            visibility: req.visibility,
            owner_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(PublishResponseDto {
        novel_id: result.novel_id,
        content_hash: result.content_hash,
        visibility: result.visibility,
        created: result.created,
    })))
}

// ============================================================================
// Like / Import
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub novel_id: String,
    #[serde(default)]
    pub current_likes: i64,
    #[serde(default)]
    pub feed_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponseDto {
    pub novel_id: String,
    pub likes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedSnapshot>,
}

pub async fn like_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<ApiResponse<LikeResponseDto>>, ApiError> {
    let result = state
        .like_novel_handler
        .handle(LikeNovel {
            novel_id: req.novel_id,
            current_likes: req.current_likes,
            feed_id: req.feed_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(LikeResponseDto {
        novel_id: result.novel_id,
        likes: result.likes,
        feed: result.feed,
    })))
}

/// 返回带新 id 的本地作品
pub async fn import_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let project = state
        .import_novel_handler
        .handle(ImportNovel {
            novel_id: req.novel_id,
            feed_id: req.feed_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gallery::{GalleryScope, GallerySort};

    #[test]
    fn test_page_request_flattens_filter() {
        let req: GalleryPageRequest =
            serde_json::from_str(r#"{"search":"crown","sort":"newest","scope":"mine","page":2}"#)
                .unwrap();
        assert_eq!(req.filter.search, "crown");
        assert_eq!(req.filter.sort, GallerySort::Newest);
        assert_eq!(req.filter.scope, GalleryScope::Mine);
        assert_eq!(req.filter.genre, "All");
        assert_eq!(req.page, 2);
        assert!(req.limit.is_none());
    }
}
