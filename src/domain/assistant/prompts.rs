//! 提示词构建
//!
//! 每个 AI 操作对应一个构建函数，只负责拼装文本，不涉及调用

use serde::{Deserialize, Serialize};

use super::pacing::{PacingAdvice, PacingAudience};
use super::settings::{tail_chars, AiSettings, StoryAction};
use crate::domain::project::{CodexEntry, WritingLanguage};

/// 对话中保留的场景尾部字符数
pub const CHAT_SCENE_CONTEXT_CHARS: usize = 4000;

/// 故事结构上下文
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryStructureContext {
    pub project_title: String,
    pub genre: String,
    pub subgenre: Option<String>,
    pub chapter_title: String,
    pub scene_title: String,
    /// 从 0 开始
    pub scene_index: u32,
    pub total_scenes_in_chapter: u32,
    pub previous_scene_summary: Option<String>,
    pub current_scene_word_count: Option<u32>,
    pub current_scene_page_count: Option<u32>,
    pub current_page_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// 对话消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// 对话时的当前写作位置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveSceneContext {
    pub chapter_title: String,
    pub scene_title: String,
    pub scene_content: String,
}

/// 一次调用的提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn language_instruction(language: WritingLanguage) -> String {
    format!(
        "IMPORTANT: You MUST write the output in {}.",
        language.display_name()
    )
}

pub fn format_codex(codex: &[CodexEntry]) -> String {
    if codex.is_empty() {
        return "No Codex entries available.".to_string();
    }
    codex
        .iter()
        .map(|entry| {
            format!(
                "[Category: {}]\nName: {}\nDescription: {}\nTags: {}",
                entry.category,
                entry.name,
                entry.description,
                entry.tags.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub fn format_structure(structure: Option<&StoryStructureContext>) -> String {
    let Some(s) = structure else {
        return String::new();
    };

    let pages = s.current_scene_page_count.unwrap_or(0);
    let mut lines = vec![
        "=== STORY STRUCTURE ===".to_string(),
        format!("Project: {}", s.project_title),
        match &s.subgenre {
            Some(sub) if !sub.is_empty() => format!("Genre: {} ({})", s.genre, sub),
            _ => format!("Genre: {}", s.genre),
        },
        format!("Current Chapter: {}", s.chapter_title),
        format!(
            "Current Scene: {} (Scene {} of {} in this chapter)",
            s.scene_title,
            s.scene_index + 1,
            s.total_scenes_in_chapter
        ),
        format!(
            "Current Scene Stats: {} words, {} pages.",
            s.current_scene_word_count.unwrap_or(0),
            pages
        ),
    ];
    if let Some(page) = s.current_page_index {
        lines.push(format!("Currently Editing: Page {} of {}.", page + 1, pages));
    }
    if let Some(summary) = s.previous_scene_summary.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("Previous Scene Summary: {summary}"));
    }
    lines.push("=======================".to_string());
    lines.join("\n")
}

/// 结构上下文中的字数与场景数（缺省为 0）
pub fn structure_counts(structure: Option<&StoryStructureContext>) -> (u32, u32) {
    structure
        .map(|s| {
            (
                s.current_scene_word_count.unwrap_or(0),
                s.total_scenes_in_chapter,
            )
        })
        .unwrap_or((0, 0))
}

fn indent_rule(language: WritingLanguage) -> (usize, String) {
    let spaces = language.indent_spaces();
    (spaces, " ".repeat(spaces))
}

fn join_sections(sections: &[String]) -> String {
    sections
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 动作判定
pub fn decide_action(
    text: &str,
    codex: &[CodexEntry],
    language: WritingLanguage,
    settings: &AiSettings,
    structure: Option<&StoryStructureContext>,
) -> Prompt {
    let (words, scenes) = structure_counts(structure);
    let pacing = PacingAdvice::from_settings(settings, words, scenes);

    let system = join_sections(&[
        "You are a story structure analyst. Analyze the current writing state and determine what action should be taken next.".to_string(),
        format_structure(structure),
        pacing.instruction(PacingAudience::Decision),
        [
            "=== SCENE COMPLETION CRITERIA ===",
            "A SCENE should trigger 'new_scene' when:",
            "1. The immediate conflict/goal is resolved",
            "2. A significant time jump occurs (hours, days, or later)",
            "3. Location changes to a different setting",
            "4. A new conversation starts with a different character focus",
            "5. The narrative perspective shifts from one character to another",
            "",
            "A CHAPTER should trigger 'new_chapter' when:",
            "1. A major story arc resolves (not just a scene goal)",
            "2. A time gap of days/weeks/months occurs",
            "3. The story moves to a completely new location/setting",
            "4. A major revelation/climax has been delivered",
            "5. The narrative structure shifts (e.g., Part 1 → Part 2)",
        ]
        .join("\n"),
        language_instruction(language),
        format!("=== CODEX (for context) ===\n{}", format_codex(codex)),
    ]);

    let user = format!(
        "Current Story Context (truncated):\n\"{}\"\n\nTask: Based on the story context and criteria above, determine the most appropriate next action.\n\nRespond with EXACTLY ONE word only (no explanation, no punctuation):\ncontinue\nnew_scene\nnew_chapter",
        settings.slice_context(text)
    );

    Prompt { system, user }
}

/// 普通续写
pub fn plain_continuation(
    text: &str,
    codex: &[CodexEntry],
    instruction: &str,
    language: WritingLanguage,
    settings: &AiSettings,
    structure: Option<&StoryStructureContext>,
) -> Prompt {
    let (spaces, example) = indent_rule(language);

    let system = join_sections(&[
        "You are an expert fiction co-author.".to_string(),
        language_instruction(language),
        settings.length().instruction(language).to_string(),
        format_structure(structure),
        format!(
            "CRITICAL FORMATTING RULES:\n1. Use DOUBLE LINE BREAKS (\\n\\n) to separate paragraphs.\n2. Indent the beginning of EVERY paragraph with {spaces} spaces (e.g. \"{example}The story...\").\n3. Do NOT output dense \"walls of text\".\n4. Use the Codex to ensure consistency."
        ),
        format!("=== CODEX ===\n{}", format_codex(codex)),
    ]);

    let user = format!(
        "Context: \"{}\"\nInstruction: {}",
        settings.slice_context(text),
        instruction
    );

    Prompt { system, user }
}

/// 智能续写（JSON 输出）
pub fn smart_continuation(
    text: &str,
    codex: &[CodexEntry],
    instruction: &str,
    language: WritingLanguage,
    settings: &AiSettings,
    structure: Option<&StoryStructureContext>,
    action: StoryAction,
) -> Prompt {
    let (spaces, _) = indent_rule(language);
    let (words, scenes) = structure_counts(structure);
    let pacing = PacingAdvice::from_settings(settings, words, scenes);
    let ignore_length = settings.ignore_length();

    let length_section = if ignore_length {
        "NOTE: For this continuation mode, you are NOT constrained by a specific word count. Generate as much or as little as needed for the scene.".to_string()
    } else {
        settings.length().instruction(language).to_string()
    };

    let system = join_sections(&[
        format!(
            "You are a smart novel writing assistant.\nGenerate content based on the determined action.\n\nDETERMINED ACTION: {action}"
        ),
        "Action Guidelines:\n1. 'continue': Continue the current scene naturally.\n2. 'new_scene': Gracefully conclude the current scene, then start a NEW SCENE with proper transition.\n3. 'new_chapter': Conclude the current narrative arc, then start a NEW CHAPTER with a title.".to_string(),
        format_structure(structure),
        pacing.instruction(PacingAudience::Generation),
        language_instruction(language),
        settings.mode().prompt(language).to_string(),
        length_section,
        format!(
            "CRITICAL FORMATTING RULES:\n- When generating 'content', strictly use DOUBLE LINE BREAKS (\\n\\n) to separate paragraphs.\n- Start EVERY paragraph in 'content' with {spaces} spaces.\n- Ensure the output is readable and not a dense block of text."
        ),
        format!("=== CODEX ===\n{}", format_codex(codex)),
    ]);

    let user = format!(
        "Current Story Context:\n\"{}\"\n\nUser Instruction: {}\n\nIMPORTANT: Your response 'action' field MUST be \"{}\".\n\nRespond in JSON format.",
        settings.slice_context(text),
        instruction,
        action
    );

    Prompt { system, user }
}

/// 智能续写的 JSON schema
pub fn smart_continuation_schema(language: WritingLanguage) -> serde_json::Value {
    let spaces = language.indent_spaces();
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "action": {
                "type": "STRING",
                "enum": ["continue", "new_scene", "new_chapter"],
                "description": "Whether to continue text, or create a new scene/chapter."
            },
            "title": {
                "type": "STRING",
                "description": "The title of the new scene or chapter (if applicable)."
            },
            "content": {
                "type": "STRING",
                "description": format!("The generated story content. MUST use \\n\\n for paragraph breaks and start each paragraph with {spaces} spaces.")
            },
            "summary": {
                "type": "STRING",
                "description": "A brief summary of the content (useful for new scene metadata)."
            }
        },
        "required": ["action", "content"]
    })
}

/// 与 Codex 对话的系统提示词
pub fn chat_system(
    codex: &[CodexEntry],
    language: WritingLanguage,
    active: Option<&ActiveSceneContext>,
) -> String {
    let scene_section = active
        .map(|a| {
            let content = if a.scene_content.is_empty() {
                "(Scene is empty)"
            } else {
                tail_chars(&a.scene_content, CHAT_SCENE_CONTEXT_CHARS)
            };
            format!(
                "=== CURRENT WRITING CONTEXT ===\nChapter: {}\nScene: {}\nCurrent Scene Content (Truncated):\n\"{}\"\n===============================",
                a.chapter_title, a.scene_title, content
            )
        })
        .unwrap_or_default();

    join_sections(&[
        "You are a helpful writing assistant (co-author).".to_string(),
        language_instruction(language),
        scene_section,
        format!("=== CODEX (WORLD BIBLE) ===\n{}", format_codex(codex)),
        "Instructions:\n1. Answer questions based on the Codex and the Current Writing Context provided above.\n2. If the user asks to rewrite something, use the context provided.\n3. Keep answers concise unless asked for elaboration.".to_string(),
    ])
}

/// Codex 条目描述生成
pub fn codex_entry(name: &str, category: &str, context: &str, language: WritingLanguage) -> Prompt {
    Prompt {
        system: format!(
            "You are a world-building assistant. {}",
            language_instruction(language)
        ),
        user: format!("Name: {name}\nCategory: {category}\nContext: {context}"),
    }
}

/// 实体扫描
pub fn extract_entities(text: &str, existing_names: &[String], language: WritingLanguage) -> Prompt {
    let system = join_sections(&[
        "You are an expert editor for novels.".to_string(),
        language_instruction(language),
        "Your task is to analyze the provided text and identify potential Codex entries (Characters, Locations, Items, Lore, Factions, Systems, Species, Events).".to_string(),
        format!(
            "Rules:\n1. Ignore entities that are already in this list: {}.\n2. Only extract IMPLICIT or EXPLICIT significant entities.\n3. Provide a brief description based ONLY on the text provided.\n4. Return a valid JSON array.",
            existing_names.join(", ")
        ),
    ]);

    Prompt {
        system,
        user: format!("Text to analyze:\n\"{text}\"\n\nExtract new entities."),
    }
}

/// 实体扫描的 JSON schema
pub fn entity_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "category": {
                    "type": "STRING",
                    "enum": ["Character", "Location", "Item", "Lore", "Faction", "System", "Species", "Event"]
                },
                "description": { "type": "STRING" },
                "tags": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["name", "category", "description", "tags"]
        }
    })
}

/// 新书开篇
pub fn novel_opening(
    title: &str,
    author: &str,
    genre: &str,
    subgenre: &str,
    language: WritingLanguage,
) -> Prompt {
    let (spaces, example) = indent_rule(language);
    let system = join_sections(&[
        format!("You are a bestselling novelist specializing in {genre} and {subgenre}."),
        language_instruction(language),
        format!("Your task is to write an engaging opening scene for a new novel.\nTitle: {title}\nAuthor: {author}"),
        format!(
            "Requirements:\n1. Start DIRECTLY with the story. Do not write \"Here is the opening...\" or meta-commentary.\n2. Hook the reader immediately with action, atmosphere, or intrigue.\n3. Match the tone of the genre ({genre} - {subgenre}).\n4. Length: Approximately 400-600 words.\n5. Use DOUBLE LINE BREAKS (\\n\\n) to separate paragraphs.\n6. Indent the beginning of EVERY paragraph with {spaces} spaces (e.g. \"{example}The story...\")."
        ),
    ]);

    Prompt {
        system,
        user: format!("Write the opening scene for \"{title}\"."),
    }
}

/// 配图提示词
pub fn image_description(selected_text: &str) -> Prompt {
    let system = [
        "You are a world-class concept artist, cinematographer, and art director.",
        "Your task is to read a selected segment of a story and convert it into a HIGH-FIDELITY IMAGE GENERATION PROMPT.",
        "",
        "The prompt should be comma-separated and optimized for top-tier models like Midjourney v6, Stable Diffusion XL, or DALL-E 3.",
        "",
        "Include:",
        "- Main Subject (character, action, focal point)",
        "- Detailed Environment/Setting",
        "- Lighting (e.g., volumetric, cinematic, chiaroscuro, golden hour)",
        "- Atmosphere/Mood (e.g., ethereal, ominous, serene)",
        "- Camera/Perspective (e.g., wide angle, macro, low angle)",
        "- Art Style (e.g., photorealistic, oil painting, cyberpunk, watercolor, 8k render, unreal engine 5)",
        "",
        "Output ONLY the raw prompt string. Do not add \"Here is the prompt:\" or any other text.",
    ]
    .join("\n");

    Prompt {
        system,
        user: format!("Story Segment:\n\"{selected_text}\"\n\nGenerate Image Prompt."),
    }
}
