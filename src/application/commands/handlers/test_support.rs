//! 命令/查询处理器测试用的内存画廊仓储

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::{GalleryRepositoryPort, RepositoryError};
use crate::domain::gallery::{
    GalleryNovel, GalleryPageQuery, GalleryRecord, GalleryScope, GallerySort, HashMatch,
    Visibility,
};
use crate::domain::project::Project;

/// 公开、无所有者的卡片
pub fn novel(id: &str, likes: i64) -> GalleryNovel {
    GalleryNovel {
        id: id.to_string(),
        title: format!("Novel {id}"),
        author: "Anon".to_string(),
        genre: "Fantasy".to_string(),
        subgenre: None,
        description: "No description provided.".to_string(),
        word_count: 100,
        visibility: Visibility::Public,
        likes,
        downloads: 0,
        published_at: likes * 1_000,
        tags: Vec::new(),
        content_hash: None,
        owner_id: None,
    }
}

pub struct MemoryGalleryRepo {
    records: Mutex<Vec<GalleryRecord>>,
    offline: AtomicBool,
    rpc_available: AtomicBool,
}

impl MemoryGalleryRepo {
    pub fn with_novels(novels: impl IntoIterator<Item = GalleryNovel>) -> Arc<Self> {
        let records = novels
            .into_iter()
            .map(|meta| {
                let mut content = Project::new(meta.title.clone(), meta.author.clone()).unwrap();
                content.id = format!("proj_{}", meta.id);
                GalleryRecord { meta, content }
            })
            .collect();
        Arc::new(Self {
            records: Mutex::new(records),
            offline: AtomicBool::new(false),
            rpc_available: AtomicBool::new(true),
        })
    }

    /// 模拟后端不可达
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// 模拟自增 RPC 未部署
    pub fn set_rpc_available(&self, available: bool) {
        self.rpc_available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn get(&self, id: &str) -> Option<GalleryRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.meta.id == id)
            .cloned()
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_rpc(&self) -> Result<(), RepositoryError> {
        self.check_online()?;
        if self.rpc_available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepositoryError::DatabaseError("function not found".to_string()))
        }
    }

    fn update<F: FnOnce(&mut GalleryNovel)>(&self, id: &str, f: F) -> Result<i64, RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.meta.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        f(&mut record.meta);
        Ok(record.meta.likes)
    }
}

#[async_trait]
impl GalleryRepositoryPort for MemoryGalleryRepo {
    async fn fetch_page(&self, query: &GalleryPageQuery) -> Result<Vec<GalleryNovel>, RepositoryError> {
        self.check_online()?;
        let filter = &query.filter;
        let mut rows: Vec<GalleryNovel> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.meta.clone())
            .filter(|n| match filter.scope {
                GalleryScope::Mine => n.owner_id.as_deref() == Some(query.owner_id.as_str()),
                GalleryScope::Community => n.visibility == Visibility::Public,
            })
            .filter(|n| filter.genre_filter().map_or(true, |g| n.genre == g))
            .filter(|n| {
                filter.search_filter().map_or(true, |s| {
                    n.title.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .collect();

        match filter.sort {
            GallerySort::Popular => rows.sort_by(|a, b| b.likes.cmp(&a.likes)),
            GallerySort::Newest => rows.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        }

        Ok(rows
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .collect())
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Vec<HashMatch>, RepositoryError> {
        self.check_online()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.meta.content_hash.as_deref() == Some(content_hash))
            .map(|r| HashMatch {
                id: r.meta.id.clone(),
                owner_id: r.meta.owner_id.clone(),
                visibility: r.meta.visibility,
            })
            .collect())
    }

    async fn insert(&self, record: &GalleryRecord) -> Result<(), RepositoryError> {
        self.check_online()?;
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<(), RepositoryError> {
        self.check_online()?;
        self.update(id, |n| n.visibility = visibility).map(|_| ())
    }

    async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        self.check_rpc()?;
        self.update(id, |n| n.likes += 1).map(Some)
    }

    async fn set_likes(&self, id: &str, likes: i64) -> Result<(), RepositoryError> {
        self.check_online()?;
        self.update(id, |n| n.likes = likes).map(|_| ())
    }

    async fn increment_downloads(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        self.check_rpc()?;
        let mut downloads = 0;
        self.update(id, |n| {
            n.downloads += 1;
            downloads = n.downloads;
        })?;
        Ok(Some(downloads))
    }

    async fn set_downloads(&self, id: &str, downloads: i64) -> Result<(), RepositoryError> {
        self.check_online()?;
        self.update(id, |n| n.downloads = downloads).map(|_| ())
    }

    async fn find_record(&self, id: &str) -> Result<Option<GalleryRecord>, RepositoryError> {
        self.check_online()?;
        Ok(self.get(id))
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        self.check_online()
    }
}
