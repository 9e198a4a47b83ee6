//! AI 返回解析
//!
//! 模型返回的 JSON 经常带 Markdown 围栏、前后缀说明，或在字符串中途被截断。
//! 这里先按严格 JSON 解析，失败后用正则逐字段恢复。

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

use super::settings::StoryAction;
use crate::domain::project::CodexCategory;

/// 解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("无法从 AI 返回中定位正文内容")]
    ContentNotFound,
}

/// 智能续写结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationReply {
    pub action: StoryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ContinuationReply {
    pub fn continue_with(content: impl Into<String>) -> Self {
        Self {
            action: StoryAction::Continue,
            title: None,
            content: content.into(),
            summary: None,
        }
    }
}

/// 从文本中扫描出的 Codex 条目（尚未分配 id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub category: CodexCategory,
    pub description: String,
    pub tags: Vec<String>,
}

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> Option<&'static Regex> {
            static CELL: OnceLock<Option<Regex>> = OnceLock::new();
            CELL.get_or_init(|| Regex::new($pattern).ok()).as_ref()
        }
    };
}

cached_regex!(fence_open_re, r"(?i)^```(?:json)?\s*");
cached_regex!(fence_close_re, r"(?i)\s*```$");
cached_regex!(array_re, r"\[[\s\S]*\]");
cached_regex!(object_re, r"\{[\s\S]*\}");
cached_regex!(content_re, r#"(?s)"content"\s*:\s*"((?:[^"\\]|\\.)*)"#);
cached_regex!(action_re, r#""action"\s*:\s*"([^"]+)""#);
cached_regex!(title_re, r#""title"\s*:\s*"([^"]+)""#);
cached_regex!(summary_re, r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#);
cached_regex!(name_re, r#""name"\s*:\s*"([^"]+)""#);
cached_regex!(category_re, r#""category"\s*:\s*"([^"]+)""#);
cached_regex!(description_re, r#""description"\s*:\s*"((?:[^"\\]|\\.)*)""#);
cached_regex!(tags_re, r#""tags"\s*:\s*\[(.*?)\]"#);

/// 去掉 Markdown 围栏；若仍不是合法 JSON，尝试截取最外层的数组或对象
pub fn clean_json_string(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut cleaned = raw.to_string();
    if let Some(re) = fence_open_re() {
        cleaned = re.replace(&cleaned, "").into_owned();
    }
    if let Some(re) = fence_close_re() {
        cleaned = re.replace(&cleaned, "").into_owned();
    }
    let cleaned = cleaned.trim().to_string();

    if is_valid_json(&cleaned) {
        return cleaned;
    }

    for re in [array_re(), object_re()].into_iter().flatten() {
        if let Some(m) = re.find(&cleaned) {
            if is_valid_json(m.as_str()) {
                return m.as_str().to_string();
            }
        }
    }

    cleaned
}

fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// 解析智能续写返回
pub fn decode_continuation(raw: &str) -> Result<ContinuationReply, DecodeError> {
    let cleaned = clean_json_string(raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => {
            if let Some(content) = map.get("content").and_then(Value::as_str) {
                let action = map
                    .get("action")
                    .and_then(Value::as_str)
                    .and_then(StoryAction::parse)
                    .unwrap_or_default();
                return Ok(ContinuationReply {
                    action,
                    title: non_empty(map.get("title").and_then(Value::as_str)),
                    content: content.to_string(),
                    summary: non_empty(map.get("summary").and_then(Value::as_str)),
                });
            }
        }
        Ok(_) => {}
        Err(e) => {
            warn!(error = %e, "AI 返回不是合法 JSON，尝试正则恢复");
        }
    }

    recover_continuation(&cleaned)
}

fn recover_continuation(cleaned: &str) -> Result<ContinuationReply, DecodeError> {
    let captured = content_re()
        .and_then(|re| re.captures(cleaned))
        .and_then(|caps| caps.get(1));

    if let Some(content) = captured {
        let action = capture_first(action_re(), cleaned)
            .and_then(|a| StoryAction::parse(&a))
            .unwrap_or_default();
        return Ok(ContinuationReply {
            action,
            title: capture_first(title_re(), cleaned),
            content: unescape_json_fragment(content.as_str()),
            summary: capture_first(summary_re(), cleaned).map(|s| unescape_json_fragment(&s)),
        });
    }

    if !cleaned.trim().starts_with('{') {
        return Ok(ContinuationReply::continue_with(cleaned));
    }

    Err(DecodeError::ContentNotFound)
}

fn capture_first(re: Option<&Regex>, text: &str) -> Option<String> {
    re?.captures(text)?.get(1).map(|m| m.as_str().to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

/// 还原 JSON 字符串转义
///
/// 片段本身合法时交给 serde_json；被截断或含原始控制字符时逐字符处理常见转义
pub fn unescape_json_fragment(fragment: &str) -> String {
    if let Ok(value) = serde_json::from_str::<String>(&format!("\"{fragment}\"")) {
        return value;
    }

    let mut out = String::with_capacity(fragment.len());
    let mut chars = fragment.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            // 截断在转义符上时原样保留
            None => out.push('\\'),
        }
    }
    out
}

/// 解析实体扫描返回
///
/// JSON 为数组时逐项读取；无法解析时按字段正则提取并按最短列表对齐；
/// 合法但非数组的 JSON 返回空列表
pub fn decode_entities(raw: &str) -> Vec<ExtractedEntity> {
    let cleaned = clean_json_string(raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => items.iter().filter_map(entity_from_value).collect(),
        Ok(other) => {
            warn!(kind = %json_kind(&other), "实体扫描结果不是数组");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "实体扫描 JSON 解析失败，尝试正则提取");
            recover_entities(&cleaned)
        }
    }
}

fn entity_from_value(value: &Value) -> Option<ExtractedEntity> {
    let obj = value.as_object()?;
    let name = obj.get("name").and_then(Value::as_str)?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .map(CodexCategory::normalize)
        .unwrap_or_default();
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let tags = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ExtractedEntity {
        name,
        category,
        description,
        tags,
    })
}

fn recover_entities(cleaned: &str) -> Vec<ExtractedEntity> {
    let names = capture_all(name_re(), cleaned);
    let categories = capture_all(category_re(), cleaned);
    let descriptions = capture_all(description_re(), cleaned);
    let tags = capture_all(tags_re(), cleaned);

    let count = names.len().min(categories.len()).min(descriptions.len());
    (0..count)
        .map(|i| ExtractedEntity {
            name: names[i].clone(),
            category: CodexCategory::normalize(&categories[i]),
            description: unescape_json_fragment(&descriptions[i]),
            tags: tags.get(i).map(|t| parse_tags(t)).unwrap_or_default(),
        })
        .collect()
}

fn capture_all(re: Option<&Regex>, text: &str) -> Vec<String> {
    match re {
        Some(re) => re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// `"a", "b"` -> ["a", "b"]
fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| {
            let s = s.trim();
            let s = s.strip_prefix('"').unwrap_or(s);
            s.strip_suffix('"').unwrap_or(s).to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{"action":"new_scene","title":"The Gate","content":"  She ran.\n\n  He followed \"quietly\".","summary":"A chase."}"#;

    #[test]
    fn test_well_formed_object() {
        let reply = decode_continuation(WELL_FORMED).unwrap();
        assert_eq!(reply.action, StoryAction::NewScene);
        assert_eq!(reply.title.as_deref(), Some("The Gate"));
        assert_eq!(reply.content, "  She ran.\n\n  He followed \"quietly\".");
        assert_eq!(reply.summary.as_deref(), Some("A chase."));
    }

    #[test]
    fn test_truncated_inside_content_recovers_prefix() {
        let truncated = r#"{"action":"new_chapter","title":"Ashes","content":"The city burned.\nNobody sle"#;
        let reply = decode_continuation(truncated).unwrap();
        assert_eq!(reply.action, StoryAction::NewChapter);
        assert_eq!(reply.title.as_deref(), Some("Ashes"));
        assert_eq!(reply.content, "The city burned.\nNobody sle");
    }

    #[test]
    fn test_truncated_after_content_matches_well_formed() {
        let full = decode_continuation(WELL_FORMED).unwrap();
        let cut = WELL_FORMED.find(",\"summary\"").unwrap();
        let truncated = decode_continuation(&WELL_FORMED[..cut]).unwrap();
        assert_eq!(truncated.content, full.content);
        assert_eq!(truncated.action, full.action);
    }

    #[test]
    fn test_missing_closing_brace() {
        let raw = r#"{"action":"continue","content":"Rain fell on Vael.""#;
        let reply = decode_continuation(raw).unwrap();
        assert_eq!(reply.action, StoryAction::Continue);
        assert_eq!(reply.content, "Rain fell on Vael.");
    }

    #[test]
    fn test_raw_control_characters_in_string() {
        let raw = "{\"action\":\"new_scene\",\"content\":\"Line one\n\tLine two\"}";
        let reply = decode_continuation(raw).unwrap();
        assert_eq!(reply.action, StoryAction::NewScene);
        assert_eq!(reply.content, "Line one\n\tLine two");
    }

    #[test]
    fn test_fenced_output() {
        let raw = "```json\n{\"action\":\"continue\",\"content\":\"Fenced.\"}\n```";
        let reply = decode_continuation(raw).unwrap();
        assert_eq!(reply.content, "Fenced.");
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Sure! Here is the continuation:\n{\"action\":\"new_scene\",\"content\":\"Dawn.\"}\nHope it helps.";
        let reply = decode_continuation(raw).unwrap();
        assert_eq!(reply.action, StoryAction::NewScene);
        assert_eq!(reply.content, "Dawn.");
    }

    #[test]
    fn test_invalid_action_defaults_to_continue() {
        let raw = r#"{"action":"rewrite","content":"x"}"#;
        assert_eq!(decode_continuation(raw).unwrap().action, StoryAction::Continue);

        let truncated = r#"{"action":"rewrite","content":"x"#;
        assert_eq!(
            decode_continuation(truncated).unwrap().action,
            StoryAction::Continue
        );
    }

    #[test]
    fn test_plain_text_is_literal_content() {
        let reply = decode_continuation("  The wind howled.").unwrap();
        assert_eq!(reply.action, StoryAction::Continue);
        assert_eq!(reply.content, "The wind howled.");
    }

    #[test]
    fn test_object_without_content_fails() {
        assert_eq!(
            decode_continuation(r#"{"action":"new_scene","title":"x"}"#),
            Err(DecodeError::ContentNotFound)
        );
        assert_eq!(
            decode_continuation(r#"{"action":"new_scene","#),
            Err(DecodeError::ContentNotFound)
        );
    }

    #[test]
    fn test_manual_unescape_for_truncated_escape() {
        assert_eq!(unescape_json_fragment(r#"a\nb\"c\\"#), "a\nb\"c\\");
        assert_eq!(unescape_json_fragment("dangling\\"), "dangling\\");
        assert_eq!(unescape_json_fragment(r"line\nend\u00"), "line\nend\\u00");
    }

    #[test]
    fn test_clean_json_string_extracts_array() {
        let raw = "Entities:\n[{\"name\":\"Vael\"}]\nDone";
        assert_eq!(clean_json_string(raw), "[{\"name\":\"Vael\"}]");
        assert_eq!(clean_json_string(""), "");
    }

    #[test]
    fn test_decode_entities_array() {
        let raw = r#"```json
[{"name":"Vael","category":"locations","description":"Port city.","tags":["coast"]},
 {"name":"Order of Ash","category":"组织","description":"Monks.","tags":[]}]
```"#;
        let entities = decode_entities(raw);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].category, CodexCategory::Location);
        assert_eq!(entities[0].tags, vec!["coast".to_string()]);
        assert_eq!(entities[1].category, CodexCategory::Faction);
    }

    #[test]
    fn test_decode_entities_regex_fallback_zips_to_shortest() {
        let raw = r#"[{"name":"Vael","category":"Location","description":"Port \"city\".","tags":["coast", "trade"]},
{"name":"Mira","category":"race","description":"Sea folk.","tags":["merfolk"]},
{"name":"Broken","category":"Item""#;
        let entities = decode_entities(raw);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].description, "Port \"city\".");
        assert_eq!(entities[0].tags, vec!["coast".to_string(), "trade".to_string()]);
        assert_eq!(entities[1].category, CodexCategory::Species);
    }

    #[test]
    fn test_decode_entities_non_array() {
        assert!(decode_entities(r#"{"name":"Vael"}"#).is_empty());
    }
}
