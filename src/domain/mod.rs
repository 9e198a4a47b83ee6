//! Domain Layer - 领域层
//!
//! 包含四个限界上下文:
//! - Project Context: 作品、章节、场景、Codex、快照
//! - Assistant Context: AI 设置、节奏判定、提示词、返回解析
//! - Reader Context: 分页阅读
//! - Gallery Context: 社区画廊与信息流

pub mod assistant;
pub mod gallery;
pub mod project;
pub mod reader;
