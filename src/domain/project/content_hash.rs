//! 内容哈希
//!
//! 对规范化后的作品字段做 SHA-256，用于检测重复发布。
//! 字段顺序固定：title, author, genre, subgenre, lang, chapters, codex；
//! 缺省的可选字段不参与序列化。

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{Project, ProjectError};

#[derive(Serialize)]
struct NormalizedProject<'a> {
    title: &'a str,
    author: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    genre: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subgenre: Option<&'a str>,
    lang: &'a str,
    chapters: Vec<NormalizedChapter<'a>>,
    codex: Vec<NormalizedCodexEntry<'a>>,
}

#[derive(Serialize)]
struct NormalizedChapter<'a> {
    title: &'a str,
    scenes: Vec<NormalizedScene<'a>>,
}

#[derive(Serialize)]
struct NormalizedScene<'a> {
    title: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
}

#[derive(Serialize)]
struct NormalizedCodexEntry<'a> {
    name: &'a str,
    cat: &'a str,
    desc: &'a str,
    tags: &'a [String],
}

/// 计算作品内容哈希（小写十六进制）
pub fn compute_content_hash(project: &Project) -> Result<String, ProjectError> {
    let normalized = NormalizedProject {
        title: &project.title,
        author: &project.author,
        genre: project.genre.as_deref(),
        subgenre: project.subgenre.as_deref(),
        lang: project.writing_language.as_str(),
        chapters: project
            .chapters
            .iter()
            .map(|c| NormalizedChapter {
                title: &c.title,
                scenes: c
                    .scenes
                    .iter()
                    .map(|s| NormalizedScene {
                        title: &s.title,
                        content: &s.content,
                        summary: s.summary.as_deref(),
                    })
                    .collect(),
            })
            .collect(),
        codex: project
            .codex
            .iter()
            .map(|e| NormalizedCodexEntry {
                name: &e.name,
                cat: e.category.as_str(),
                desc: &e.description,
                tags: &e.tags,
            })
            .collect(),
    };

    let json = serde_json::to_string(&normalized)
        .map_err(|e| ProjectError::Serialization(e.to_string()))?;
    Ok(format!("{:x}", Sha256::digest(json.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::aggregate::fixtures::sample_project;

    #[test]
    fn test_hash_is_stable_across_ids_and_snapshots() {
        let a = sample_project();
        let mut b = a.clone();
        b.id = "imported_123_proj_".to_string();
        b.last_modified = Some(42);
        b.create_snapshot("note", 1);
        b.chapters[0].id = "other".to_string();

        assert_eq!(compute_content_hash(&a).unwrap(), compute_content_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_changes_with_content() {
        let a = sample_project();
        let mut b = a.clone();
        b.chapters[0].scenes[0].content.push('!');
        assert_ne!(compute_content_hash(&a).unwrap(), compute_content_hash(&b).unwrap());

        let mut c = a.clone();
        c.writing_language = crate::domain::project::WritingLanguage::Zh;
        assert_ne!(compute_content_hash(&a).unwrap(), compute_content_hash(&c).unwrap());
    }

    #[test]
    fn test_hash_of_minimal_project_matches_known_serialization() {
        let mut project = Project::new("T", "A").unwrap();
        project.id = "x".to_string();
        let expected = format!(
            "{:x}",
            Sha256::digest(br#"{"title":"T","author":"A","lang":"en","chapters":[],"codex":[]}"#)
        );
        assert_eq!(compute_content_hash(&project).unwrap(), expected);
    }
}
