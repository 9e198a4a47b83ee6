//! Reader Context - 分页阅读与 Codex 高亮

pub mod highlight;
pub mod pagination;

pub use highlight::{CodexHighlighter, HighlightSpan};
pub use pagination::{
    classify, paginate, split_paragraphs, Block, BlockBox, BoxModelMeasurer, PageLayout,
    TextMeasurer, TypeStyle,
};
