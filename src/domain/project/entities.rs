//! Project Context - Entities

use serde::{Deserialize, Serialize};

use super::Project;

/// Codex 条目分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CodexCategory {
    #[default]
    Character,
    Location,
    Item,
    Lore,
    /// 组织、公会、家族
    Faction,
    /// 魔法体系、科技规则、法律
    System,
    /// 种族、生物、植物
    Species,
    /// 历史、战争、时间线
    Event,
}

impl CodexCategory {
    pub const ALL: [CodexCategory; 8] = [
        CodexCategory::Character,
        CodexCategory::Location,
        CodexCategory::Item,
        CodexCategory::Lore,
        CodexCategory::Faction,
        CodexCategory::System,
        CodexCategory::Species,
        CodexCategory::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodexCategory::Character => "Character",
            CodexCategory::Location => "Location",
            CodexCategory::Item => "Item",
            CodexCategory::Lore => "Lore",
            CodexCategory::Faction => "Faction",
            CodexCategory::System => "System",
            CodexCategory::Species => "Species",
            CodexCategory::Event => "Event",
        }
    }

    /// 归一化模型返回的分类（大小写、复数、中文标签），无法识别时归为 Character
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "character" | "characters" | "人物" => CodexCategory::Character,
            "location" | "locations" | "地点" => CodexCategory::Location,
            "item" | "items" | "物品" => CodexCategory::Item,
            "lore" | "设定" => CodexCategory::Lore,
            "faction" | "factions" | "组织" => CodexCategory::Faction,
            "system" | "systems" | "系统" => CodexCategory::System,
            "species" | "race" | "races" | "种族" => CodexCategory::Species,
            "event" | "events" | "事件" => CodexCategory::Event,
            _ => CodexCategory::Character,
        }
    }
}

impl std::fmt::Display for CodexCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codex（世界设定）条目
///
/// name 同时作为正文高亮的匹配键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodexEntry {
    pub id: String,
    pub name: String,
    pub category: CodexCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 场景 - 最小正文单位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// 章节 - 有序的场景列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// 历史快照
///
/// data 中不包含嵌套的快照列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    /// 毫秒时间戳
    pub timestamp: i64,
    pub note: String,
    pub data: Box<Project>,
}
