//! NovelFlow - 小说创作工作室后端
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Project Context: 作品、章节、场景、Codex、快照、内容哈希
//! - Assistant Context: AI 设置、节奏判定、提示词、返回解析
//! - Reader Context: 分页阅读与 Codex 高亮
//! - Gallery Context: 社区画廊与信息流状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AiProvider, ImageGenerator, GalleryRepository, Identity, FeedStore）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API + WebSocket
//! - Adapters: Gemini / DeepSeek / OpenAI 兼容配图客户端
//! - Persistence: SQLite 与 Supabase 画廊
//! - Identity: 本地所有者 id 文件
//! - Memory: 信息流内存存储
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
