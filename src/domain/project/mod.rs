//! Project Context - 作品限界上下文
//!
//! 职责:
//! - 作品聚合（章节 / 场景 / Codex / 快照）
//! - 内容哈希（发布去重）
//! - 字数统计

mod aggregate;
mod content_hash;
mod entities;
mod errors;
mod value_objects;
mod word_count;

pub use aggregate::{Project, ProjectMetadata};
pub use content_hash::compute_content_hash;
pub use entities::{Chapter, CodexCategory, CodexEntry, Scene, Snapshot};
pub use errors::ProjectError;
pub use value_objects::WritingLanguage;
pub use word_count::count_words;

#[cfg(test)]
pub(crate) use aggregate::fixtures;
