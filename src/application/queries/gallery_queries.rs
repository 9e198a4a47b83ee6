//! Gallery Queries

use serde::Serialize;

use crate::domain::gallery::{GalleryFilter, GalleryNovel};

/// 无状态分页查询
#[derive(Debug, Clone, Default)]
pub struct GetGalleryPage {
    pub filter: GalleryFilter,
    /// 从 0 开始
    pub page: usize,
    /// 未指定时使用配置中的页大小
    pub limit: Option<usize>,
    pub owner_id: String,
}

/// 分页查询结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPageResponse {
    pub novels: Vec<GalleryNovel>,
    pub page: usize,
    pub has_more: bool,
}

/// 阅读画廊作品（不计入下载）
#[derive(Debug, Clone)]
pub struct ReadGalleryNovel {
    pub novel_id: String,
}

/// 画廊后端连通性检查
#[derive(Debug, Clone, Copy, Default)]
pub struct TestGalleryConnection;

#[derive(Debug, Clone, Serialize)]
pub struct GalleryConnectionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 获取信息流当前视图
#[derive(Debug, Clone)]
pub struct GetFeed {
    pub feed_id: String,
}
