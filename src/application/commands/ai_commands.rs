//! AI Commands

use crate::domain::assistant::{ActiveSceneContext, AiSettings, ChatMessage, StoryStructureContext};
use crate::domain::project::{CodexEntry, WritingLanguage};

/// 未给出指令时的续写指令
pub const DEFAULT_INSTRUCTION: &str = "Continue the story naturally.";

/// 续写命令（普通续写与智能续写共用）
#[derive(Debug, Clone, Default)]
pub struct ContinueStory {
    pub text: String,
    pub codex: Vec<CodexEntry>,
    pub instruction: String,
    pub language: WritingLanguage,
    pub settings: AiSettings,
    pub structure: Option<StoryStructureContext>,
}

impl ContinueStory {
    pub fn instruction(&self) -> &str {
        if self.instruction.trim().is_empty() {
            DEFAULT_INSTRUCTION
        } else {
            &self.instruction
        }
    }
}

/// 动作判定命令
#[derive(Debug, Clone, Default)]
pub struct DecideAction {
    pub text: String,
    pub codex: Vec<CodexEntry>,
    pub language: WritingLanguage,
    pub settings: AiSettings,
    pub structure: Option<StoryStructureContext>,
}

impl From<&ContinueStory> for DecideAction {
    fn from(command: &ContinueStory) -> Self {
        Self {
            text: command.text.clone(),
            codex: command.codex.clone(),
            language: command.language,
            settings: command.settings.clone(),
            structure: command.structure.clone(),
        }
    }
}

/// 与 Codex 对话
#[derive(Debug, Clone, Default)]
pub struct ChatWithCodex {
    pub history: Vec<ChatMessage>,
    pub message: String,
    pub codex: Vec<CodexEntry>,
    pub language: WritingLanguage,
    pub settings: AiSettings,
    pub active_scene: Option<ActiveSceneContext>,
}

/// 生成 Codex 条目描述
#[derive(Debug, Clone, Default)]
pub struct GenerateCodexEntry {
    pub name: String,
    pub category: String,
    pub context: String,
    pub language: WritingLanguage,
    pub settings: AiSettings,
}

/// 从正文扫描新实体
#[derive(Debug, Clone, Default)]
pub struct ExtractEntities {
    pub text: String,
    pub existing_names: Vec<String>,
    pub language: WritingLanguage,
    pub settings: AiSettings,
}

/// 生成新书开篇
#[derive(Debug, Clone, Default)]
pub struct GenerateOpening {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub subgenre: String,
    pub language: WritingLanguage,
    pub settings: AiSettings,
}

/// 由选中文本生成配图提示词
#[derive(Debug, Clone, Default)]
pub struct GenerateImagePrompt {
    pub selected_text: String,
    pub settings: AiSettings,
}

/// 生成配图
#[derive(Debug, Clone, Default)]
pub struct GenerateImage {
    pub prompt: String,
    pub settings: AiSettings,
}
