//! Data Transfer Objects
//!
//! 统一响应信封与各处理器共用的请求结构。请求字段使用 camelCase，与前端保持一致。

use serde::{Deserialize, Serialize};

use crate::domain::project::Project;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// 共用请求
// ============================================================================

/// 只携带作品的请求（统计、快照列表）
#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub project: Project,
}

/// 携带作品与快照 id 的请求（恢复、删除）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub project: Project,
    pub snapshot_id: String,
}

/// 按 id 操作信息流
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedIdRequest {
    pub feed_id: String,
}

/// 按 id 操作画廊作品
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelIdRequest {
    pub novel_id: String,
    #[serde(default)]
    pub feed_id: Option<String>,
}
