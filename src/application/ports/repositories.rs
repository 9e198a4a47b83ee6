//! Repository Ports - 出站端口
//!
//! 定义画廊数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite / Supabase）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::gallery::{GalleryNovel, GalleryPageQuery, GalleryRecord, HashMatch, Visibility};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 后端无法连接或未配置
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Gallery Repository
// ============================================================================

/// Gallery Repository Port
///
/// 计数器的 `increment_*` 对应后端的原子自增（RPC），失败时调用方改用 `set_*` 手动写入。
/// 自增成功时若后端能返回新值则为 `Some`。
#[async_trait]
pub trait GalleryRepositoryPort: Send + Sync {
    /// 按过滤条件分页查询（不含正文）
    async fn fetch_page(&self, query: &GalleryPageQuery)
        -> Result<Vec<GalleryNovel>, RepositoryError>;

    /// 按内容哈希查找已发布记录
    async fn find_by_hash(&self, content_hash: &str) -> Result<Vec<HashMatch>, RepositoryError>;

    /// 插入新记录
    async fn insert(&self, record: &GalleryRecord) -> Result<(), RepositoryError>;

    /// 更新可见性
    async fn update_visibility(&self, id: &str, visibility: Visibility)
        -> Result<(), RepositoryError>;

    /// 点赞数原子自增
    async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError>;

    /// 直接写入点赞数
    async fn set_likes(&self, id: &str, likes: i64) -> Result<(), RepositoryError>;

    /// 下载数原子自增
    async fn increment_downloads(&self, id: &str) -> Result<Option<i64>, RepositoryError>;

    /// 直接写入下载数
    async fn set_downloads(&self, id: &str, downloads: i64) -> Result<(), RepositoryError>;

    /// 获取完整记录（含正文）
    async fn find_record(&self, id: &str) -> Result<Option<GalleryRecord>, RepositoryError>;

    /// 连通性检查
    async fn health_check(&self) -> Result<(), RepositoryError>;
}
