//! Project Queries

use serde::Serialize;

use crate::domain::assistant::{AiSettings, PacingLevel};
use crate::domain::project::Project;

/// 作品统计（字数、章节数、内容哈希）
#[derive(Debug, Clone)]
pub struct GetProjectStats {
    pub project: Project,
}

/// 快照列表
#[derive(Debug, Clone)]
pub struct ListSnapshots {
    pub project: Project,
}

/// 快照摘要（不含正文）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub id: String,
    pub timestamp: i64,
    pub note: String,
    pub word_count: usize,
}

/// 节奏预览：不调用模型，只计算建议文本
#[derive(Debug, Clone, Default)]
pub struct PreviewPacing {
    pub settings: AiSettings,
    pub current_words: u32,
    pub current_scenes: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingPreview {
    pub level: PacingLevel,
    pub chapter_words: u32,
    pub decision_instruction: String,
    pub generation_instruction: String,
}
