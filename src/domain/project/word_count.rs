//! 字数统计
//!
//! 中文字符逐字计数，其余文本按空白分词计数

/// 判断是否为计数用的 CJK 统一汉字（U+4E00..=U+9FA5）
#[inline]
fn is_cjk_ideograph(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&ch)
}

/// 统计文本字数
pub fn count_words(text: &str) -> usize {
    let cjk = text.chars().filter(|c| is_cjk_ideograph(*c)).count();
    let rest: String = text
        .chars()
        .map(|c| if is_cjk_ideograph(c) { ' ' } else { c })
        .collect();
    cjk + rest.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_words() {
        assert_eq!(count_words("The  quick\nbrown fox."), 4);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t"), 0);
    }

    #[test]
    fn test_mixed_cjk() {
        // 5 个汉字 + "AI" + "v2"
        assert_eq!(count_words("斗之力AI三段 v2"), 7);
    }

    #[test]
    fn test_cjk_punctuation_not_counted_as_ideograph() {
        // 全角标点不在汉字区间内，紧贴汉字时作为独立词元计数
        assert_eq!(count_words("你好，世界"), 5);
    }
}
