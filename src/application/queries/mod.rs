//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：画廊浏览、阅读分页、作品统计

mod gallery_queries;
mod project_queries;
mod reader_queries;

pub mod handlers;

pub use gallery_queries::*;
pub use project_queries::*;
pub use reader_queries::*;
