//! Feed Handlers - 有状态的画廊信息流（无限滚动）
//!
//! 每次调用返回最新视图；异步完成的变更通过 `/ws/feed/:feed_id` 推送

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{ChangeFeedFilter, CloseFeed, GetFeed, LoadMoreFeed, OpenFeed};
use crate::domain::gallery::{FeedSnapshot, GalleryFilter};
use crate::infrastructure::http::dto::{ApiResponse, Empty, FeedIdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::handlers::identity::OwnerId;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenFeedRequest {
    pub filter: GalleryFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFeedResponseDto {
    pub feed_id: String,
    pub snapshot: FeedSnapshot,
}

pub async fn open_feed(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<OpenFeedRequest>,
) -> Result<Json<ApiResponse<OpenFeedResponseDto>>, ApiError> {
    let result = state
        .open_feed_handler
        .handle(OpenFeed {
            filter: req.filter,
            owner_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(OpenFeedResponseDto {
        feed_id: result.feed_id,
        snapshot: result.snapshot,
    })))
}

/// 哨兵可见
pub async fn load_more(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedIdRequest>,
) -> Result<Json<ApiResponse<FeedSnapshot>>, ApiError> {
    let snapshot = state
        .load_more_feed_handler
        .handle(LoadMoreFeed {
            feed_id: req.feed_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFilterRequest {
    pub feed_id: String,
    pub filter: GalleryFilter,
}

pub async fn change_filter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangeFilterRequest>,
) -> Result<Json<ApiResponse<FeedSnapshot>>, ApiError> {
    let snapshot = state
        .change_feed_filter_handler
        .handle(ChangeFeedFilter {
            feed_id: req.feed_id,
            filter: req.filter,
        })
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedIdRequest>,
) -> Result<Json<ApiResponse<FeedSnapshot>>, ApiError> {
    let snapshot = state.get_feed_handler.handle(GetFeed {
        feed_id: req.feed_id,
    })?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn close_feed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.close_feed_handler.handle(CloseFeed {
        feed_id: req.feed_id,
    })?;
    Ok(Json(ApiResponse::ok()))
}
