//! Project Context - Value Objects

use serde::{Deserialize, Serialize};

/// 写作语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingLanguage {
    #[default]
    En,
    Zh,
    Ja,
    Ko,
    Es,
    Fr,
    De,
    It,
    Ru,
    Pt,
}

impl WritingLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingLanguage::En => "en",
            WritingLanguage::Zh => "zh",
            WritingLanguage::Ja => "ja",
            WritingLanguage::Ko => "ko",
            WritingLanguage::Es => "es",
            WritingLanguage::Fr => "fr",
            WritingLanguage::De => "de",
            WritingLanguage::It => "it",
            WritingLanguage::Ru => "ru",
            WritingLanguage::Pt => "pt",
        }
    }

    /// 提示词中使用的语言名称
    pub fn display_name(&self) -> &'static str {
        match self {
            WritingLanguage::En => "English",
            WritingLanguage::Zh => "Simplified Chinese (简体中文)",
            WritingLanguage::Ja => "Japanese (日本語)",
            WritingLanguage::Ko => "Korean (한국어)",
            WritingLanguage::Es => "Spanish (Español)",
            WritingLanguage::Fr => "French (Français)",
            WritingLanguage::De => "German (Deutsch)",
            WritingLanguage::It => "Italian (Italiano)",
            WritingLanguage::Ru => "Russian (Русский)",
            WritingLanguage::Pt => "Portuguese (Português)",
        }
    }

    /// 中日韩语言段首缩进 4 空格，其他语言 2 空格
    pub fn is_cjk(&self) -> bool {
        matches!(self, WritingLanguage::Zh | WritingLanguage::Ja | WritingLanguage::Ko)
    }

    pub fn indent_spaces(&self) -> usize {
        if self.is_cjk() {
            4
        } else {
            2
        }
    }
}

impl std::fmt::Display for WritingLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serde_lowercase() {
        let lang: WritingLanguage = serde_json::from_str("\"ja\"").unwrap();
        assert_eq!(lang, WritingLanguage::Ja);
        assert_eq!(serde_json::to_string(&WritingLanguage::Zh).unwrap(), "\"zh\"");
    }

    #[test]
    fn test_indent_by_language() {
        assert_eq!(WritingLanguage::Ko.indent_spaces(), 4);
        assert_eq!(WritingLanguage::Fr.indent_spaces(), 2);
    }
}
