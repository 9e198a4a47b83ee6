//! 应用层 - 命令（写操作 / 外部调用）
//!
//! CQRS 命令侧：AI 生成、画廊写操作、快照管理

mod ai_commands;
mod gallery_commands;
mod project_commands;

pub mod handlers;

pub use ai_commands::*;
pub use gallery_commands::*;
pub use project_commands::*;
