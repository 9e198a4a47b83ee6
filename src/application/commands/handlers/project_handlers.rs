//! Project Command Handlers
//!
//! 快照管理：输入完整作品，返回修改后的作品

use chrono::Utc;

use crate::application::commands::{CreateSnapshot, DeleteSnapshot, RestoreSnapshot};
use crate::application::error::ApplicationError;
use crate::domain::project::Project;

/// 创建快照的结果
#[derive(Debug, Clone)]
pub struct CreateSnapshotResponse {
    pub snapshot_id: String,
    pub project: Project,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateSnapshotHandler;

impl CreateSnapshotHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, command: CreateSnapshot) -> Result<CreateSnapshotResponse, ApplicationError> {
        let mut project = command.project;
        let note = command.note.trim();
        let note = if note.is_empty() {
            "Manual snapshot".to_string()
        } else {
            note.to_string()
        };

        let snapshot_id = project.create_snapshot(note, Utc::now().timestamp_millis());
        tracing::info!(
            project_id = %project.id,
            snapshot_id = %snapshot_id,
            "Snapshot created"
        );

        Ok(CreateSnapshotResponse {
            snapshot_id,
            project,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreSnapshotHandler;

impl RestoreSnapshotHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, command: RestoreSnapshot) -> Result<Project, ApplicationError> {
        let mut project = command.project;
        project.restore_snapshot(&command.snapshot_id, Utc::now().timestamp_millis())?;
        tracing::info!(
            project_id = %project.id,
            snapshot_id = %command.snapshot_id,
            "Snapshot restored"
        );
        Ok(project)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteSnapshotHandler;

impl DeleteSnapshotHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, command: DeleteSnapshot) -> Result<Project, ApplicationError> {
        let mut project = command.project;
        project.delete_snapshot(&command.snapshot_id)?;
        tracing::debug!(snapshot_id = %command.snapshot_id, "Snapshot deleted");
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::fixtures::sample_project;

    #[test]
    fn test_create_and_restore() {
        let created = CreateSnapshotHandler::new()
            .handle(CreateSnapshot {
                project: sample_project(),
                note: "  ".to_string(),
            })
            .unwrap();
        let snapshots = created.project.snapshots.clone().unwrap();
        assert_eq!(snapshots[0].note, "Manual snapshot");

        let mut edited = created.project;
        edited.title = "Draft Two".to_string();

        let restored = RestoreSnapshotHandler::new()
            .handle(RestoreSnapshot {
                project: edited,
                snapshot_id: created.snapshot_id,
            })
            .unwrap();
        assert_eq!(restored.title, "The Starless Crown");
        assert!(restored.last_modified.is_some());
    }

    #[test]
    fn test_unknown_snapshot_is_not_found() {
        let result = DeleteSnapshotHandler::new().handle(DeleteSnapshot {
            project: sample_project(),
            snapshot_id: "snap_missing".to_string(),
        });
        assert!(matches!(
            result,
            Err(ApplicationError::NotFound {
                resource_type: "Snapshot",
                ..
            })
        ));
    }
}
