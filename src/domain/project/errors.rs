//! Project Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("快照不存在: {0}")]
    SnapshotNotFound(String),

    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("序列化失败: {0}")]
    Serialization(String),
}
