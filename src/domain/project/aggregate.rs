//! Project Context - Aggregate Root

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    compute_content_hash, count_words, Chapter, CodexEntry, ProjectError, Snapshot,
    WritingLanguage,
};

/// Project 聚合根
///
/// 不变量:
/// - 章节与场景保持作者给定的顺序
/// - 快照中的数据不再嵌套快照
/// - content_hash 只由规范化后的正文字段决定（与 id / 快照 / 时间无关）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgenre: Option<String>,
    #[serde(default)]
    pub writing_language: WritingLanguage,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub codex: Vec<CodexEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<Vec<Snapshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// 作品列表元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgenre: Option<String>,
    pub writing_language: WritingLanguage,
    pub last_modified: i64,
    pub word_count: usize,
    pub chapter_count: usize,
    pub content_hash: String,
}

impl Project {
    /// 创建空作品
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Result<Self, ProjectError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ProjectError::InvalidTitle("标题不能为空".to_string()));
        }
        Ok(Self {
            id: format!("proj_{}", Uuid::new_v4().simple()),
            title,
            author: author.into(),
            genre: None,
            subgenre: None,
            writing_language: WritingLanguage::default(),
            chapters: Vec::new(),
            codex: Vec::new(),
            snapshots: None,
            last_modified: None,
            content_hash: None,
        })
    }

    /// 全书字数
    pub fn word_count(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|c| c.scenes.iter())
            .map(|s| count_words(&s.content))
            .sum()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// 规范化内容的 SHA-256
    pub fn content_hash(&self) -> Result<String, ProjectError> {
        compute_content_hash(self)
    }

    /// 首章首场景的摘要（画廊卡片描述）
    pub fn first_scene_summary(&self) -> Option<&str> {
        self.chapters
            .first()
            .and_then(|c| c.scenes.first())
            .and_then(|s| s.summary.as_deref())
    }

    pub fn metadata(&self, now_ms: i64) -> Result<ProjectMetadata, ProjectError> {
        Ok(ProjectMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            subgenre: self.subgenre.clone(),
            writing_language: self.writing_language,
            last_modified: self.last_modified.unwrap_or(now_ms),
            word_count: self.word_count(),
            chapter_count: self.chapter_count(),
            content_hash: self.content_hash()?,
        })
    }

    // ========== Snapshots ==========

    /// 创建快照，返回新快照 id
    pub fn create_snapshot(&mut self, note: impl Into<String>, now_ms: i64) -> String {
        let mut data = self.clone();
        data.snapshots = None;

        let id = format!("snap_{}", Uuid::new_v4().simple());
        self.snapshots.get_or_insert_with(Vec::new).push(Snapshot {
            id: id.clone(),
            timestamp: now_ms,
            note: note.into(),
            data: Box::new(data),
        });
        id
    }

    /// 恢复快照：正文替换为快照数据，保留作品 id 与快照列表
    pub fn restore_snapshot(&mut self, snapshot_id: &str, now_ms: i64) -> Result<(), ProjectError> {
        let snapshot = self
            .snapshots
            .as_ref()
            .and_then(|list| list.iter().find(|s| s.id == snapshot_id))
            .cloned()
            .ok_or_else(|| ProjectError::SnapshotNotFound(snapshot_id.to_string()))?;

        let id = std::mem::take(&mut self.id);
        let snapshots = self.snapshots.take();

        *self = *snapshot.data;
        self.id = id;
        self.snapshots = snapshots;
        self.last_modified = Some(now_ms);
        Ok(())
    }

    pub fn delete_snapshot(&mut self, snapshot_id: &str) -> Result<(), ProjectError> {
        let list = self
            .snapshots
            .as_mut()
            .ok_or_else(|| ProjectError::SnapshotNotFound(snapshot_id.to_string()))?;
        let before = list.len();
        list.retain(|s| s.id != snapshot_id);
        if list.len() == before {
            return Err(ProjectError::SnapshotNotFound(snapshot_id.to_string()));
        }
        Ok(())
    }

    /// 快照列表（按时间倒序）
    pub fn snapshots_newest_first(&self) -> Vec<&Snapshot> {
        let mut list: Vec<&Snapshot> = self.snapshots.iter().flatten().collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_project;
    use super::*;

    #[test]
    fn test_new_project_rejects_blank_title() {
        assert!(Project::new("   ", "Anon").is_err());
    }

    #[test]
    fn test_word_count_and_metadata() {
        let project = sample_project();
        assert_eq!(project.word_count(), 7);
        let meta = project.metadata(1_000).unwrap();
        assert_eq!(meta.chapter_count, 1);
        assert_eq!(meta.last_modified, 1_000);
        assert_eq!(meta.content_hash.len(), 64);
    }

    #[test]
    fn test_project_json_is_camel_case() {
        let json = serde_json::to_value(sample_project()).unwrap();
        assert_eq!(json["writingLanguage"], "en");
        assert!(json.get("snapshots").is_none());
    }

    #[test]
    fn test_snapshot_restore_keeps_list_and_id() {
        let mut project = sample_project();
        let snap_id = project.create_snapshot("before rewrite", 10);

        project.title = "Renamed".to_string();
        project.chapters.clear();

        project.restore_snapshot(&snap_id, 20).unwrap();
        assert_eq!(project.title, "The Starless Crown");
        assert_eq!(project.chapters.len(), 1);
        assert_eq!(project.id, "proj_1");
        assert_eq!(project.snapshots.as_ref().unwrap().len(), 1);
        assert_eq!(project.last_modified, Some(20));
        // 快照数据不嵌套快照
        assert!(project.snapshots.as_ref().unwrap()[0].data.snapshots.is_none());
    }

    #[test]
    fn test_snapshot_ordering_and_delete() {
        let mut project = sample_project();
        let first = project.create_snapshot("a", 1);
        let second = project.create_snapshot("b", 5);

        let ordered: Vec<&str> = project
            .snapshots_newest_first()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ordered, vec![second.as_str(), first.as_str()]);

        project.delete_snapshot(&first).unwrap();
        assert!(matches!(
            project.delete_snapshot(&first),
            Err(ProjectError::SnapshotNotFound(_))
        ));
        assert_eq!(project.snapshots_newest_first().len(), 1);
    }

    #[test]
    fn test_restore_unknown_snapshot() {
        let mut project = sample_project();
        assert!(project.restore_snapshot("nope", 1).is_err());
    }
}
