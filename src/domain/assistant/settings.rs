//! AI 写作助手设置
//!
//! 与前端 AIConfig 对应的请求级设置，以及续写长度 / 上下文大小等常量表

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::project::WritingLanguage;

/// 默认每场景目标字数
pub const DEFAULT_TARGET_SCENE_WORDS: u32 = 2000;

/// 默认每章目标场景数
pub const DEFAULT_TARGET_SCENES_PER_CHAPTER: u32 = 5;

/// 文本模型提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Gemini,
    Deepseek,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini",
            AiProvider::Deepseek => "deepseek",
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图片生成提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageProvider {
    #[default]
    Gemini,
    OpenaiCompatible,
}

/// 续写后的结构动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryAction {
    #[default]
    Continue,
    NewScene,
    NewChapter,
}

impl StoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryAction::Continue => "continue",
            StoryAction::NewScene => "new_scene",
            StoryAction::NewChapter => "new_chapter",
        }
    }

    /// 严格匹配三个取值之一
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "continue" => Some(StoryAction::Continue),
            "new_scene" => Some(StoryAction::NewScene),
            "new_chapter" => Some(StoryAction::NewChapter),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 续写模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationMode {
    #[default]
    General,
    Action,
    Dialogue,
    Description,
    Twist,
}

impl ContinuationMode {
    /// 模式提示语
    pub fn prompt(&self, language: WritingLanguage) -> &'static str {
        let zh = language == WritingLanguage::Zh;
        match (self, zh) {
            (ContinuationMode::General, false) => {
                "Continue the story naturally based on the previous context."
            }
            (ContinuationMode::General, true) => "根据前文自然地续写故事。",
            (ContinuationMode::Action, false) => {
                "Focus on high-paced action, combat, and physical movements."
            }
            (ContinuationMode::Action, true) => "重点描写快节奏的动作、战斗和肢体细节。",
            (ContinuationMode::Dialogue, false) => {
                "Focus on character interaction and meaningful dialogue."
            }
            (ContinuationMode::Dialogue, true) => "重点描写角色之间的互动和富有深意的对话。",
            (ContinuationMode::Description, false) => {
                "Focus on describing the setting, atmosphere, and sensory details."
            }
            (ContinuationMode::Description, true) => "重点描写场景、氛围和感官细节。",
            (ContinuationMode::Twist, false) => {
                "Introduce a surprising plot twist or unexpected event."
            }
            (ContinuationMode::Twist, true) => "引入一个令人惊讶的情节反转或意外事件。",
        }
    }

    /// 模式自身是否默认忽略长度限制（目前所有模式均受限制）
    pub fn ignores_length_by_default(&self) -> bool {
        false
    }
}

/// 续写长度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationLength {
    Short,
    #[default]
    Medium,
    Long,
    VeryLong,
}

impl ContinuationLength {
    /// 生成的最大 token 数
    pub fn max_tokens(&self) -> u32 {
        match self {
            ContinuationLength::Short => 1000,
            ContinuationLength::Medium => 2000,
            ContinuationLength::Long => 4000,
            ContinuationLength::VeryLong => 8000,
        }
    }

    /// 长度指令（中文写作用中文指令，其余用英文）
    pub fn instruction(&self, language: WritingLanguage) -> &'static str {
        let zh = language == WritingLanguage::Zh;
        match (self, zh) {
            (ContinuationLength::Short, false) => {
                "Write a short continuation, approximately 200 words."
            }
            (ContinuationLength::Short, true) => "请写一段约200字的简短续写。",
            (ContinuationLength::Medium, false) => {
                "Write a medium length continuation, approximately 500 words."
            }
            (ContinuationLength::Medium, true) => "请写一段约500字的中等篇幅续写。",
            (ContinuationLength::Long, false) => {
                "Write a long continuation, approximately 1000 words."
            }
            (ContinuationLength::Long, true) => "请写一段约1000字的长篇续写。",
            (ContinuationLength::VeryLong, false) => {
                "Write a very extensive continuation, approximately 2000 words."
            }
            (ContinuationLength::VeryLong, true) => "请写一段约2000字的超长篇幅续写。",
        }
    }
}

/// 上下文窗口大小
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSize {
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

impl ContextSize {
    /// 保留的尾部字符数
    pub fn chars(&self) -> usize {
        match self {
            ContextSize::Small => 1000,
            ContextSize::Medium => 3000,
            ContextSize::Large => 6000,
            ContextSize::Huge => 12000,
        }
    }
}

/// 请求级 AI 设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: AiProvider,
    /// 覆盖服务端配置的模型名
    pub model: Option<String>,
    pub continuation_mode: Option<ContinuationMode>,
    pub continuation_length: Option<ContinuationLength>,
    pub context_size: Option<ContextSize>,
    /// true 表示该模式忽略长度限制
    pub mode_length_overrides: HashMap<ContinuationMode, bool>,
    /// 显式指定动作时跳过动作判定
    pub explicit_action: Option<StoryAction>,
    pub target_scene_word_count: Option<u32>,
    pub target_scene_count_per_chapter: Option<u32>,
    /// 覆盖服务端配置的 DeepSeek Key
    pub deepseek_api_key: Option<String>,

    pub image_provider: Option<ImageProvider>,
    pub image_model: Option<String>,
    pub image_base_url: Option<String>,
    pub image_api_key: Option<String>,
    pub image_size: Option<String>,
}

impl AiSettings {
    pub fn mode(&self) -> ContinuationMode {
        self.continuation_mode.unwrap_or_default()
    }

    pub fn length(&self) -> ContinuationLength {
        self.continuation_length.unwrap_or_default()
    }

    pub fn context(&self) -> ContextSize {
        self.context_size.unwrap_or_default()
    }

    /// 每场景目标字数（未设置或为 0 时取默认值）
    pub fn target_scene_words(&self) -> u32 {
        self.target_scene_word_count
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TARGET_SCENE_WORDS)
    }

    /// 每章目标场景数（未设置或为 0 时取默认值）
    pub fn target_scenes_per_chapter(&self) -> u32 {
        self.target_scene_count_per_chapter
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TARGET_SCENES_PER_CHAPTER)
    }

    /// 当前模式是否忽略长度限制
    pub fn ignore_length(&self) -> bool {
        let mode = self.mode();
        mode.ignores_length_by_default()
            || self.mode_length_overrides.get(&mode).copied().unwrap_or(false)
    }

    /// 按上下文大小截取文本尾部
    pub fn slice_context<'a>(&self, text: &'a str) -> &'a str {
        tail_chars(text, self.context().chars())
    }
}

/// 截取最后 limit 个字符
pub fn tail_chars(text: &str, limit: usize) -> &str {
    let total = text.chars().count();
    if total <= limit {
        return text;
    }
    let skip = total - limit;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: AiSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.provider, AiProvider::Gemini);
        assert_eq!(settings.length().max_tokens(), 2000);
        assert_eq!(settings.context().chars(), 3000);
        assert_eq!(settings.target_scene_words(), 2000);
        assert_eq!(settings.target_scenes_per_chapter(), 5);
        assert!(!settings.ignore_length());
    }

    #[test]
    fn test_settings_camel_case_fields() {
        let settings: AiSettings = serde_json::from_str(
            r#"{
                "provider": "deepseek",
                "continuationMode": "dialogue",
                "continuationLength": "very_long",
                "contextSize": "huge",
                "modeLengthOverrides": {"dialogue": true},
                "explicitAction": "new_chapter",
                "targetSceneWordCount": 0
            }"#,
        )
        .unwrap();
        assert_eq!(settings.provider, AiProvider::Deepseek);
        assert_eq!(settings.length().max_tokens(), 8000);
        assert_eq!(settings.context().chars(), 12000);
        assert!(settings.ignore_length());
        assert_eq!(settings.explicit_action, Some(StoryAction::NewChapter));
        assert_eq!(settings.target_scene_words(), DEFAULT_TARGET_SCENE_WORDS);
    }

    #[test]
    fn test_story_action_parse_is_strict() {
        assert_eq!(StoryAction::parse("new_scene"), Some(StoryAction::NewScene));
        assert_eq!(StoryAction::parse("New_Scene"), None);
        assert_eq!(StoryAction::parse("rewrite"), None);
    }

    #[test]
    fn test_tail_chars_counts_characters() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("第一章开始", 2), "开始");
    }

    #[test]
    fn test_length_instruction_language() {
        assert!(ContinuationLength::Short
            .instruction(WritingLanguage::Zh)
            .contains("200字"));
        assert!(ContinuationLength::Short
            .instruction(WritingLanguage::Ja)
            .contains("200 words"));
    }
}
