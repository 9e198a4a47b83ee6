//! 阅读器分页
//!
//! 把场景正文按段落装入固定高度的页面。段落之间以空行分隔，
//! 单个段落永不拆分，超高段落独占一页。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_width::UnicodeWidthChar;

/// A4 高度（96 DPI）
pub const DEFAULT_PAGE_HEIGHT_PX: f64 = 1123.0;
/// 页面填充率
pub const DEFAULT_FILL_RATIO: f64 = 0.90;
/// 210mm @ 96 DPI
pub const DEFAULT_PAGE_WIDTH_PX: f64 = 793.7;
pub const DEFAULT_PADDING_PX: f64 = 48.0;

const PAGE_SEPARATOR: &str = "\n\n";

fn paragraph_split_re() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"\n\s*\n").ok()).as_ref()
}

fn image_re() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^!\[(.*?)\]\((.*?)\)$").ok()).as_ref()
}

fn heading_re() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)^(INT\.|EXT\.|EST\.|I/E\.|内\.|外\.|场景\.)").ok())
        .as_ref()
}

/// 页面几何参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageLayout {
    pub page_height: f64,
    pub fill_ratio: f64,
    pub page_width: f64,
    /// 四周内边距（border-box）
    pub padding: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_height: DEFAULT_PAGE_HEIGHT_PX,
            fill_ratio: DEFAULT_FILL_RATIO,
            page_width: DEFAULT_PAGE_WIDTH_PX,
            padding: DEFAULT_PADDING_PX,
        }
    }
}

impl PageLayout {
    /// 单页可用高度
    pub fn capacity(&self) -> f64 {
        self.page_height * self.fill_ratio
    }

    pub fn content_width(&self) -> f64 {
        (self.page_width - self.padding * 2.0).max(0.0)
    }
}

/// 段落类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Image { alt: &'a str, src: &'a str },
    Heading(&'a str),
    Prose(&'a str),
}

/// 按渲染规则判断段落类型
pub fn classify(paragraph: &str) -> Block<'_> {
    let trimmed = paragraph.trim();
    if let Some(caps) = image_re().and_then(|re| re.captures(trimmed)) {
        let alt = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let src = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return Block::Image { alt, src };
    }
    if heading_re().is_some_and(|re| re.is_match(trimmed)) {
        return Block::Heading(paragraph);
    }
    Block::Prose(paragraph)
}

/// 按空行切分段落（保留空白段落，由调用方过滤）
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    match paragraph_split_re() {
        Some(re) => re.split(text).collect(),
        None => vec![text],
    }
}

/// 段落的盒模型尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockBox {
    pub height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

/// 文本测量
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, block: &Block<'_>, content_width: f64) -> BlockBox;
}

/// 字体排版参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeStyle {
    pub font_size: f64,
    pub line_height: f64,
    /// 单列字符宽度占字号的比例
    pub advance_ratio: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

/// 默认测量器：按显示列宽贪心折行的确定性模型
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxModelMeasurer {
    pub prose: TypeStyle,
    pub heading: TypeStyle,
    pub image_height: f64,
    pub image_margin: f64,
}

impl Default for BoxModelMeasurer {
    fn default() -> Self {
        Self {
            // text-lg leading-loose mb-6
            prose: TypeStyle {
                font_size: 18.0,
                line_height: 36.0,
                advance_ratio: 0.5,
                margin_top: 0.0,
                margin_bottom: 24.0,
            },
            // text-xl tracking-wide my-6
            heading: TypeStyle {
                font_size: 20.0,
                line_height: 28.0,
                advance_ratio: 0.55,
                margin_top: 24.0,
                margin_bottom: 24.0,
            },
            image_height: 400.0,
            image_margin: 32.0,
        }
    }
}

impl BoxModelMeasurer {
    fn text_box(&self, text: &str, style: &TypeStyle, content_width: f64) -> BlockBox {
        let column_px = style.font_size * style.advance_ratio;
        let max_columns = if column_px > 0.0 {
            (content_width / column_px).floor().max(1.0) as usize
        } else {
            usize::MAX
        };
        let lines = wrapped_line_count(text, max_columns);
        BlockBox {
            height: lines as f64 * style.line_height,
            margin_top: style.margin_top,
            margin_bottom: style.margin_bottom,
        }
    }
}

impl TextMeasurer for BoxModelMeasurer {
    fn measure(&self, block: &Block<'_>, content_width: f64) -> BlockBox {
        match block {
            Block::Image { .. } => BlockBox {
                height: self.image_height,
                margin_top: self.image_margin,
                margin_bottom: self.image_margin,
            },
            Block::Heading(text) => self.text_box(text, &self.heading, content_width),
            Block::Prose(text) => self.text_box(text, &self.prose, content_width),
        }
    }
}

/// 贪心折行后的行数
///
/// 空白折叠为单个空格；宽字符（CJK）各自是断行点；
/// 超过一行宽度的单词按列宽硬切
fn wrapped_line_count(text: &str, max_columns: usize) -> usize {
    let mut wrapper = LineWrapper::new(max_columns);
    let mut word = 0usize;
    let mut spaced = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if word > 0 {
                wrapper.place(word, spaced);
                word = 0;
            }
            spaced = true;
            continue;
        }
        let width = c.width().unwrap_or(0);
        if width >= 2 {
            if word > 0 {
                wrapper.place(word, spaced);
                word = 0;
                spaced = false;
            }
            wrapper.place(width, spaced);
            spaced = false;
        } else {
            word += width;
        }
    }
    if word > 0 {
        wrapper.place(word, spaced);
    }

    wrapper.finish()
}

struct LineWrapper {
    max: usize,
    lines: usize,
    line: usize,
}

impl LineWrapper {
    fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            lines: 0,
            line: 0,
        }
    }

    fn place(&mut self, width: usize, spaced: bool) {
        if width == 0 {
            return;
        }
        let gap = usize::from(spaced && self.line > 0);
        if self.line > 0 && self.line + gap + width > self.max {
            self.lines += 1;
            self.line = 0;
            self.fill(width);
        } else {
            self.fill(gap + width);
        }
    }

    fn fill(&mut self, mut width: usize) {
        while self.line + width > self.max {
            width -= self.max - self.line;
            self.lines += 1;
            self.line = 0;
        }
        self.line += width;
    }

    fn finish(self) -> usize {
        (self.lines + usize::from(self.line > 0)).max(1)
    }
}

/// 页面中已放置的段落高度（相邻外边距折叠）
#[derive(Debug, Clone, Copy)]
struct PageStack {
    padding: f64,
    content: f64,
    last_margin_bottom: Option<f64>,
}

impl PageStack {
    fn new(padding: f64) -> Self {
        Self {
            padding,
            content: 0.0,
            last_margin_bottom: None,
        }
    }

    fn added(&self, bx: &BlockBox) -> f64 {
        match self.last_margin_bottom {
            None => bx.margin_top + bx.height,
            Some(prev) => self.content - prev + prev.max(bx.margin_top) + bx.height,
        }
    }

    fn height_with(&self, bx: &BlockBox) -> f64 {
        self.padding * 2.0 + self.added(bx) + bx.margin_bottom
    }

    fn push(&mut self, bx: &BlockBox) {
        self.content = self.added(bx) + bx.margin_bottom;
        self.last_margin_bottom = Some(bx.margin_bottom);
    }
}

/// 分页
///
/// - 空文本返回空列表
/// - 非空但全部为空白段落时返回一个空页
/// - 页内段落以 `\n\n` 连接，拼接所有页面可还原全部非空段落
pub fn paginate(text: &str, layout: &PageLayout, measurer: &dyn TextMeasurer) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let capacity = layout.capacity();
    let content_width = layout.content_width();

    let mut pages: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut stack = PageStack::new(layout.padding);

    for paragraph in split_paragraphs(text) {
        if paragraph.trim().is_empty() {
            continue;
        }

        let bx = measurer.measure(&classify(paragraph), content_width);

        if stack.height_with(&bx) > capacity {
            if current.is_empty() {
                // 超高段落独占一页
                pages.push(paragraph.to_string());
                stack = PageStack::new(layout.padding);
            } else {
                pages.push(current.join(PAGE_SEPARATOR));
                current = vec![paragraph];
                stack = PageStack::new(layout.padding);
                stack.push(&bx);
            }
        } else {
            current.push(paragraph);
            stack.push(&bx);
        }
    }

    if !current.is_empty() {
        pages.push(current.join(PAGE_SEPARATOR));
    }

    if pages.is_empty() {
        pages.push(String::new());
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 每个段落固定高度，便于精确断言分页位置
    struct FixedMeasurer(f64);

    impl TextMeasurer for FixedMeasurer {
        fn measure(&self, block: &Block<'_>, _content_width: f64) -> BlockBox {
            let height = match block {
                Block::Prose(text) if text.starts_with("HUGE") => 5000.0,
                _ => self.0,
            };
            BlockBox {
                height,
                margin_top: 0.0,
                margin_bottom: 0.0,
            }
        }
    }

    fn non_blank(text: &str) -> Vec<String> {
        split_paragraphs(text)
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_empty_and_blank_input() {
        let layout = PageLayout::default();
        let m = BoxModelMeasurer::default();
        assert!(paginate("", &layout, &m).is_empty());
        assert_eq!(paginate("\n\n   \n\n", &layout, &m), vec![String::new()]);
    }

    #[test]
    fn test_fixed_heights_break_exactly() {
        // 容量 1010.7，内边距 96，每段 300 -> 每页 3 段（96 + 900 = 996）
        let layout = PageLayout::default();
        let text = (1..=7).map(|i| format!("P{i}")).collect::<Vec<_>>().join("\n\n");
        let pages = paginate(&text, &layout, &FixedMeasurer(300.0));
        assert_eq!(pages, vec!["P1\n\nP2\n\nP3", "P4\n\nP5\n\nP6", "P7"]);
    }

    #[test]
    fn test_oversized_paragraph_gets_own_page() {
        let layout = PageLayout::default();
        let pages = paginate("HUGE block\n\nsmall", &layout, &FixedMeasurer(100.0));
        assert_eq!(pages, vec!["HUGE block", "small"]);

        let pages = paginate("a\n\nHUGE block\n\nb", &layout, &FixedMeasurer(100.0));
        assert_eq!(pages, vec!["a", "HUGE block", "b"]);
    }

    #[test]
    fn test_pages_rejoin_to_paragraphs() {
        let mut text = String::new();
        for i in 0..120 {
            if i % 17 == 0 {
                text.push_str("INT. HARBOR - NIGHT\n\n");
            }
            if i % 29 == 0 {
                text.push_str("![The gate](https://img.example/gate.png)\n\n");
            }
            text.push_str(&format!(
                "  Paragraph {i} walks along the quay where gulls circle over the moored ships and the tide slowly turns.\n \n"
            ));
        }
        text.push_str("第一章的结尾，港口的灯火一盏一盏熄灭。");

        let layout = PageLayout::default();
        let pages = paginate(&text, &layout, &BoxModelMeasurer::default());
        assert!(pages.len() > 1);

        let rejoined: Vec<String> = pages
            .iter()
            .flat_map(|p| p.split(PAGE_SEPARATOR).map(str::to_string).collect::<Vec<_>>())
            .collect();
        assert_eq!(rejoined, non_blank(&text));

        // 相同输入相同结果
        assert_eq!(pages, paginate(&text, &layout, &BoxModelMeasurer::default()));
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("![Map of Vael](data:image/png;base64,AAA)"),
            Block::Image {
                alt: "Map of Vael",
                src: "data:image/png;base64,AAA"
            }
        );
        assert!(matches!(classify("int. castle - day"), Block::Heading(_)));
        assert!(matches!(classify("场景. 港口"), Block::Heading(_)));
        assert!(matches!(classify("Interior thoughts"), Block::Prose(_)));
    }

    #[test]
    fn test_wrapped_line_count() {
        assert_eq!(wrapped_line_count("", 10), 1);
        assert_eq!(wrapped_line_count("aaaa bbbb", 10), 1);
        assert_eq!(wrapped_line_count("aaaa bbbb cc", 10), 2);
        assert_eq!(wrapped_line_count("aaaaaaaaaaaaaaaaaaaaaaaaa", 10), 3);
        // 宽字符每个占 2 列
        assert_eq!(wrapped_line_count("港口的灯火一盏一盏熄灭", 10), 3);
    }

    #[test]
    fn test_measurer_collapses_margins() {
        let m = BoxModelMeasurer::default();
        let mut stack = PageStack::new(0.0);
        let prose = m.measure(&Block::Prose("a"), 700.0);
        let heading = m.measure(&Block::Heading("INT. X"), 700.0);
        stack.push(&prose);
        // 36 + max(24, 24) + 28 + 24
        assert_eq!(stack.height_with(&heading), 36.0 + 24.0 + 28.0 + 24.0);
    }
}
