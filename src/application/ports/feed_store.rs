//! Feed Store Port - 画廊信息流生命周期管理
//!
//! 定义信息流存储的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::gallery::{FeedAction, FeedEffect, FeedSnapshot, GalleryFeed};

/// Feed Store 错误
#[derive(Debug, Error)]
pub enum FeedStoreError {
    #[error("Feed not found: {0}")]
    NotFound(String),
}

/// 信息流条目（in-memory）
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub id: String,
    /// mine 范围查询使用的所有者
    pub owner_id: String,
    pub feed: GalleryFeed,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl FeedEntry {
    pub fn new(owner_id: impl Into<String>, feed: GalleryFeed) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            feed,
            created_at: now,
            last_activity: now,
        }
    }
}

/// Feed Store Port
///
/// 信息流只通过 reducer 变更，所有状态存储在内存中
pub trait FeedStorePort: Send + Sync {
    /// 保存新信息流，返回 id
    fn create(&self, entry: FeedEntry) -> String;

    /// 投递动作，返回需执行的副作用与最新视图
    fn dispatch(
        &self,
        id: &str,
        action: FeedAction,
    ) -> Result<(Vec<FeedEffect>, FeedSnapshot), FeedStoreError>;

    /// 当前视图
    fn snapshot(&self, id: &str) -> Result<FeedSnapshot, FeedStoreError>;

    /// 所有者
    fn owner_of(&self, id: &str) -> Result<String, FeedStoreError>;

    /// 关闭信息流
    fn close(&self, id: &str) -> Result<(), FeedStoreError>;

    /// 获取所有过期信息流的 ID
    fn get_expired(&self, idle_timeout_secs: u64) -> Vec<String>;

    /// 获取所有信息流 ID
    fn list_all(&self) -> Vec<String>;
}
