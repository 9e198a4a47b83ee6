//! Project Commands
//!
//! 作品由客户端持有，命令携带完整作品并返回修改后的作品

use crate::domain::project::Project;

/// 创建快照
#[derive(Debug, Clone)]
pub struct CreateSnapshot {
    pub project: Project,
    pub note: String,
}

/// 恢复快照
#[derive(Debug, Clone)]
pub struct RestoreSnapshot {
    pub project: Project,
    pub snapshot_id: String,
}

/// 删除快照
#[derive(Debug, Clone)]
pub struct DeleteSnapshot {
    pub project: Project,
    pub snapshot_id: String,
}
