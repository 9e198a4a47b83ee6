//! Project Query Handlers

use chrono::Utc;

use crate::application::error::ApplicationError;
use crate::application::queries::{
    GetProjectStats, ListSnapshots, PacingPreview, PreviewPacing, SnapshotSummary,
};
use crate::domain::assistant::{PacingAdvice, PacingAudience};
use crate::domain::project::ProjectMetadata;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetProjectStatsHandler;

impl GetProjectStatsHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, query: GetProjectStats) -> Result<ProjectMetadata, ApplicationError> {
        Ok(query.project.metadata(Utc::now().timestamp_millis())?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListSnapshotsHandler;

impl ListSnapshotsHandler {
    pub fn new() -> Self {
        Self
    }

    /// 按时间倒序
    pub fn handle(&self, query: ListSnapshots) -> Vec<SnapshotSummary> {
        query
            .project
            .snapshots_newest_first()
            .into_iter()
            .map(|s| SnapshotSummary {
                id: s.id.clone(),
                timestamp: s.timestamp,
                note: s.note.clone(),
                word_count: s.data.word_count(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewPacingHandler;

impl PreviewPacingHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, query: PreviewPacing) -> PacingPreview {
        let advice =
            PacingAdvice::from_settings(&query.settings, query.current_words, query.current_scenes);
        PacingPreview {
            level: advice.level,
            chapter_words: advice.chapter_words,
            decision_instruction: advice.instruction(PacingAudience::Decision),
            generation_instruction: advice.instruction(PacingAudience::Generation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assistant::PacingLevel;
    use crate::domain::project::fixtures::sample_project;

    #[test]
    fn test_stats() {
        let meta = GetProjectStatsHandler::new()
            .handle(GetProjectStats {
                project: sample_project(),
            })
            .unwrap();
        assert_eq!(meta.word_count, 7);
        assert_eq!(meta.chapter_count, 1);
        assert_eq!(meta.content_hash, sample_project().content_hash().unwrap());
    }

    #[test]
    fn test_snapshots_newest_first() {
        let mut project = sample_project();
        let old = project.create_snapshot("old", 1);
        let new = project.create_snapshot("new", 2);

        let list = ListSnapshotsHandler::new().handle(ListSnapshots { project });
        let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![new.as_str(), old.as_str()]);
        assert_eq!(list[0].word_count, 7);
    }

    #[test]
    fn test_pacing_preview() {
        let preview = PreviewPacingHandler::new().handle(PreviewPacing {
            current_words: 2501,
            current_scenes: 1,
            ..Default::default()
        });
        assert_eq!(preview.level, PacingLevel::SceneAlert);
        assert!(preview.decision_instruction.starts_with("PACING ALERT"));
    }
}
