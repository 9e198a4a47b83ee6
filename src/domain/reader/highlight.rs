//! Codex 名称高亮

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::project::{CodexCategory, CodexEntry};

/// 高亮区间（字符偏移，左闭右开）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub category: CodexCategory,
}

/// 由 Codex 构建的匹配器
///
/// 同一位置优先匹配更长的名称；名称重复时以后出现的条目分类为准
#[derive(Debug, Clone)]
pub struct CodexHighlighter {
    pattern: Option<Regex>,
    categories: HashMap<String, CodexCategory>,
}

impl CodexHighlighter {
    pub fn new(codex: &[CodexEntry]) -> Self {
        let mut categories = HashMap::new();
        for entry in codex {
            let name = entry.name.trim();
            if !name.is_empty() {
                categories.insert(name.to_string(), entry.category);
            }
        }

        let mut names: Vec<&String> = categories.keys().collect();
        names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let pattern = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|n| regex::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!("({alternation})")).ok()
        };

        Self {
            pattern,
            categories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    /// 查找文本中所有不重叠的 Codex 名称
    pub fn spans(&self, text: &str) -> Vec<HighlightSpan> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        let mut byte_cursor = 0usize;
        let mut char_cursor = 0usize;

        for m in pattern.find_iter(text) {
            char_cursor += text[byte_cursor..m.start()].chars().count();
            let start = char_cursor;
            char_cursor += m.as_str().chars().count();
            byte_cursor = m.end();

            if let Some(category) = self.categories.get(m.as_str()) {
                spans.push(HighlightSpan {
                    start,
                    end: char_cursor,
                    name: m.as_str().to_string(),
                    category: *category,
                });
            }
        }
        spans
    }
}
