//! File Identity Store
//!
//! 所有者 id 保存在一个文本文件中，首次启动时生成随机 UUID

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::application::ports::{IdentityError, IdentityPort};

/// id 最大长度
const MAX_ID_LEN: usize = 128;

pub struct FileIdentityStore {
    path: PathBuf,
    current: RwLock<String>,
}

impl FileIdentityStore {
    /// 读取已有 id，不存在或为空时生成并写入
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref().to_path_buf();

        let existing = match std::fs::read_to_string(&path) {
            Ok(content) => Some(content.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(IdentityError::Io(e.to_string())),
        };

        let id = match existing {
            Some(id) => {
                tracing::info!(path = %path.display(), "Owner identity loaded");
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                write_id(&path, &id)?;
                tracing::info!(path = %path.display(), "Owner identity generated");
                id
            }
        };

        Ok(Self {
            path,
            current: RwLock::new(id),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

fn write_id(path: &Path, id: &str) -> Result<(), IdentityError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IdentityError::Io(e.to_string()))?;
    }
    std::fs::write(path, id).map_err(|e| IdentityError::Io(e.to_string()))
}

/// 校验并规范化手动输入的 id
fn normalize(id: &str) -> Result<&str, IdentityError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(IdentityError::Invalid("id must not be empty".to_string()));
    }
    if id.chars().count() > MAX_ID_LEN {
        return Err(IdentityError::Invalid(format!(
            "id must be at most {MAX_ID_LEN} characters"
        )));
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(IdentityError::Invalid(
            "id must not contain whitespace".to_string(),
        ));
    }
    Ok(id)
}

impl IdentityPort for FileIdentityStore {
    fn owner_id(&self) -> String {
        self.current
            .read()
            .map(|id| id.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn set_owner_id(&self, id: &str) -> Result<(), IdentityError> {
        let id = normalize(id)?;
        write_id(&self.path, id)?;
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = id.to_string();
        tracing::info!("Owner identity updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generates_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("identity");

        let store = FileIdentityStore::open(&path).unwrap();
        let id = store.owner_id();
        assert!(Uuid::parse_str(&id).is_ok());

        // 再次打开得到同一个 id
        let reopened = FileIdentityStore::open(&path).unwrap();
        assert_eq!(reopened.owner_id(), id);
    }

    #[test]
    fn test_set_owner_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");
        let store = FileIdentityStore::open(&path).unwrap();

        store.set_owner_id("  shared-device-id \n").unwrap();
        assert_eq!(store.owner_id(), "shared-device-id");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "shared-device-id");

        assert!(matches!(store.set_owner_id("   "), Err(IdentityError::Invalid(_))));
        assert!(matches!(store.set_owner_id("a b"), Err(IdentityError::Invalid(_))));
        assert_eq!(store.owner_id(), "shared-device-id");
    }
}
