//! Reader Queries

use serde::Serialize;

use crate::domain::project::CodexEntry;
use crate::domain::reader::PageLayout;

/// 分页阅读
#[derive(Debug, Clone, Default)]
pub struct PaginateText {
    pub text: String,
    /// 未指定时使用配置中的页面参数
    pub layout: Option<PageLayout>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginateResponse {
    pub pages: Vec<String>,
    pub page_count: usize,
}

/// Codex 名称高亮
#[derive(Debug, Clone, Default)]
pub struct HighlightCodex {
    pub text: String,
    pub codex: Vec<CodexEntry>,
}
