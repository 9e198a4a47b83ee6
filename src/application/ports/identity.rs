//! Identity Port - 本地所有者标识
//!
//! 无账户体系，用一个随机 id 标记发布者

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid owner id: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub trait IdentityPort: Send + Sync {
    /// 当前 id（不存在时生成并保存）
    fn owner_id(&self) -> String;

    /// 手动指定 id（跨设备同步）
    fn set_owner_id(&self, id: &str) -> Result<(), IdentityError>;
}
