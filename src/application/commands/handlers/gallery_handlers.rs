//! Gallery Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::feed_handlers::{send_like, FeedEffectRunner};
use crate::application::commands::{ImportNovel, LikeNovel, PublishNovel};
use crate::application::error::ApplicationError;
use crate::application::ports::{FeedStorePort, GalleryRepositoryPort};
use crate::domain::gallery::{
    imported_project_id, FeedAction, FeedSnapshot, GalleryRecord, Visibility,
};
use crate::domain::project::Project;
use crate::infrastructure::events::EventPublisher;

/// 不同所有者发布了完全相同的内容
pub const DUPLICATE_CONTENT: &str = "This exact version of the novel already exists in the Gallery.";

// ============================================================================
// PublishNovel
// ============================================================================

/// 发布结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishNovelResponse {
    pub novel_id: String,
    pub content_hash: String,
    pub visibility: Visibility,
    /// false 表示同一所有者已发布过相同内容
    pub created: bool,
}

pub struct PublishNovelHandler {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl PublishNovelHandler {
    pub fn new(
        gallery_repo: Arc<dyn GalleryRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            gallery_repo,
            event_publisher,
        }
    }

    /// 按内容哈希去重：同一所有者幂等成功（必要时更新可见性），其他所有者冲突
    pub async fn handle(&self, command: PublishNovel) -> Result<PublishNovelResponse, ApplicationError> {
        if command.owner_id.trim().is_empty() {
            return Err(ApplicationError::validation("Owner id is required"));
        }
        if command.project.title.trim().is_empty() {
            return Err(ApplicationError::validation("Title is required"));
        }

        let content_hash = command.project.content_hash()?;
        let existing = self.gallery_repo.find_by_hash(&content_hash).await?;

        if let Some(found) = existing.first() {
            if found.owner_id.as_deref() != Some(command.owner_id.as_str()) {
                tracing::warn!(
                    novel_id = %found.id,
                    content_hash = %content_hash,
                    "Duplicate content published by another owner"
                );
                return Err(ApplicationError::conflict(DUPLICATE_CONTENT));
            }

            if found.visibility != command.visibility {
                self.gallery_repo
                    .update_visibility(&found.id, command.visibility)
                    .await?;
                tracing::info!(
                    novel_id = %found.id,
                    visibility = %command.visibility,
                    "Gallery visibility updated"
                );
            } else {
                tracing::info!(novel_id = %found.id, "Content already published by owner");
            }

            return Ok(PublishNovelResponse {
                novel_id: found.id.clone(),
                content_hash,
                visibility: command.visibility,
                created: false,
            });
        }

        let record = GalleryRecord::from_project(
            Uuid::new_v4().to_string(),
            &command.project,
            content_hash.clone(),
            command.visibility,
            command.owner_id,
            Utc::now().timestamp_millis(),
        );
        self.gallery_repo.insert(&record).await?;

        tracing::info!(
            novel_id = %record.meta.id,
            title = %record.meta.title,
            visibility = %record.meta.visibility,
            word_count = record.meta.word_count,
            "Novel published"
        );
        self.event_publisher.publish_novel_published(
            &record.meta.id,
            &record.meta.title,
            record.meta.visibility,
        );

        Ok(PublishNovelResponse {
            novel_id: record.meta.id,
            content_hash,
            visibility: command.visibility,
            created: true,
        })
    }
}

// ============================================================================
// LikeNovel
// ============================================================================

/// 点赞结果
#[derive(Debug, Clone)]
pub struct LikeNovelResponse {
    pub novel_id: String,
    pub likes: i64,
    /// 通过信息流点赞时返回最新视图
    pub feed: Option<FeedSnapshot>,
}

pub struct LikeNovelHandler {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
    runner: FeedEffectRunner,
    event_publisher: Arc<EventPublisher>,
}

impl LikeNovelHandler {
    pub fn new(
        gallery_repo: Arc<dyn GalleryRepositoryPort>,
        runner: FeedEffectRunner,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            gallery_repo,
            runner,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: LikeNovel) -> Result<LikeNovelResponse, ApplicationError> {
        if let Some(feed_id) = &command.feed_id {
            if let Some(response) = self.like_in_feed(feed_id, &command).await? {
                return Ok(response);
            }
            tracing::debug!(
                feed_id = %feed_id,
                novel_id = %command.novel_id,
                "Novel not loaded in feed, liking directly"
            );
        }

        let likes = send_like(
            self.gallery_repo.as_ref(),
            &command.novel_id,
            command.current_likes,
        )
        .await?;
        self.event_publisher
            .publish_novel_liked(&command.novel_id, likes);

        Ok(LikeNovelResponse {
            novel_id: command.novel_id,
            likes,
            feed: None,
        })
    }

    /// 经由信息流 reducer 点赞；作品未加载且未点过赞时返回 None
    ///
    /// 结果只取决于本次 `SendLike` 的回灌动作，执行期间列表被重置也不影响判断
    async fn like_in_feed(
        &self,
        feed_id: &str,
        command: &LikeNovel,
    ) -> Result<Option<LikeNovelResponse>, ApplicationError> {
        let (snapshot, outcomes) = self
            .runner
            .dispatch_with_outcomes(
                feed_id,
                FeedAction::LikeOptimistic {
                    id: command.novel_id.clone(),
                },
            )
            .await?;

        let outcome = outcomes.into_iter().find(|action| match action {
            FeedAction::LikeConfirmed { id, .. } | FeedAction::LikeFailed { id } => {
                *id == command.novel_id
            }
            _ => false,
        });

        let likes = match outcome {
            Some(FeedAction::LikeConfirmed { likes, .. }) => likes,
            Some(_) => {
                // 乐观更新已回滚
                return Err(ApplicationError::ExternalServiceError(format!(
                    "Failed to like novel {}",
                    command.novel_id
                )));
            }
            None if snapshot.liked_ids.contains(&command.novel_id) => {
                // 已点过赞：reducer 不产生副作用，计数不变
                snapshot
                    .novels
                    .iter()
                    .find(|n| n.id == command.novel_id)
                    .map_or(command.current_likes, |n| n.likes)
            }
            None => return Ok(None),
        };

        Ok(Some(LikeNovelResponse {
            novel_id: command.novel_id.clone(),
            likes,
            feed: Some(snapshot),
        }))
    }
}

// ============================================================================
// ImportNovel
// ============================================================================

pub struct ImportNovelHandler {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
    feed_store: Arc<dyn FeedStorePort>,
    event_publisher: Arc<EventPublisher>,
}

impl ImportNovelHandler {
    pub fn new(
        gallery_repo: Arc<dyn GalleryRepositoryPort>,
        feed_store: Arc<dyn FeedStorePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            gallery_repo,
            feed_store,
            event_publisher,
        }
    }

    /// 返回带新 id 的本地作品；下载计数在后台完成，不影响导入结果
    pub async fn handle(&self, command: ImportNovel) -> Result<Project, ApplicationError> {
        let record = self
            .gallery_repo
            .find_record(&command.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", command.novel_id.clone()))?;

        let repo = self.gallery_repo.clone();
        let novel_id = command.novel_id.clone();
        let downloads = record.meta.downloads;
        tokio::spawn(async move {
            record_download(repo.as_ref(), &novel_id, downloads).await;
        });

        if let Some(feed_id) = &command.feed_id {
            match self.feed_store.dispatch(
                feed_id,
                FeedAction::Downloaded {
                    id: command.novel_id.clone(),
                },
            ) {
                Ok((_, snapshot)) => self.event_publisher.publish_feed_updated(feed_id, snapshot),
                Err(e) => tracing::debug!(feed_id = %feed_id, error = %e, "Feed not updated"),
            }
        }
        self.event_publisher.publish_novel_imported(&command.novel_id);

        let mut project = record.content;
        project.id = imported_project_id(&project.id, Utc::now().timestamp_millis());

        tracing::info!(
            novel_id = %command.novel_id,
            project_id = %project.id,
            title = %project.title,
            "Novel imported"
        );
        Ok(project)
    }
}

/// 下载数：先走原子自增，失败时手动写入；最终失败只记录日志
async fn record_download(repo: &dyn GalleryRepositoryPort, novel_id: &str, downloads: i64) {
    if let Err(e) = repo.increment_downloads(novel_id).await {
        tracing::warn!(
            novel_id = %novel_id,
            error = %e,
            "increment_downloads failed, falling back to manual update"
        );
        if let Err(e) = repo.set_downloads(novel_id, downloads + 1).await {
            tracing::error!(novel_id = %novel_id, error = %e, "Failed to record download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::handlers::test_support::{novel, MemoryGalleryRepo};
    use crate::application::commands::OpenFeed;
    use crate::application::commands::handlers::OpenFeedHandler;
    use crate::domain::project::fixtures::sample_project;
    use crate::infrastructure::memory::InMemoryFeedStore;
    use crate::application::ports::RepositoryError;
    use crate::domain::gallery::{GalleryFilter, GalleryNovel, GalleryPageQuery, GallerySort, HashMatch};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn publish_handler(repo: &Arc<MemoryGalleryRepo>) -> PublishNovelHandler {
        PublishNovelHandler::new(repo.clone(), EventPublisher::new().arc())
    }

    fn publish(owner: &str, visibility: Visibility) -> PublishNovel {
        PublishNovel {
            project: sample_project(),
            visibility,
            owner_id: owner.to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_is_idempotent_for_owner() {
        let repo = MemoryGalleryRepo::with_novels([]);
        let handler = publish_handler(&repo);

        let first = handler.handle(publish("me", Visibility::Private)).await.unwrap();
        assert!(first.created);

        let second = handler.handle(publish("me", Visibility::Private)).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.novel_id, first.novel_id);
        assert_eq!(repo.len(), 1);

        // 可见性变化时只更新可见性
        handler.handle(publish("me", Visibility::Public)).await.unwrap();
        assert_eq!(repo.get(&first.novel_id).unwrap().meta.visibility, Visibility::Public);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_conflict_for_other_owner() {
        let repo = MemoryGalleryRepo::with_novels([]);
        let handler = publish_handler(&repo);

        handler.handle(publish("me", Visibility::Public)).await.unwrap();
        let err = handler.handle(publish("you", Visibility::Public)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Conflict(ref msg) if msg == DUPLICATE_CONTENT));
    }

    #[tokio::test]
    async fn test_published_record_contents() {
        let repo = MemoryGalleryRepo::with_novels([]);
        let result = publish_handler(&repo)
            .handle(publish("me", Visibility::Public))
            .await
            .unwrap();

        let record = repo.get(&result.novel_id).unwrap();
        assert_eq!(record.meta.owner_id.as_deref(), Some("me"));
        assert_eq!(record.meta.content_hash.as_deref(), Some(result.content_hash.as_str()));
        assert_eq!(record.content.content_hash, record.meta.content_hash);
        assert_eq!(record.meta.likes, 0);
    }

    fn like_handler(repo: &Arc<MemoryGalleryRepo>, store: &Arc<InMemoryFeedStore>) -> LikeNovelHandler {
        let events = EventPublisher::new().arc();
        let runner = FeedEffectRunner::new(repo.clone(), store.clone(), events.clone());
        LikeNovelHandler::new(repo.clone(), runner, events)
    }

    #[tokio::test]
    async fn test_like_without_feed_falls_back_to_manual_update() {
        let repo = MemoryGalleryRepo::with_novels([novel("a", 3)]);
        repo.set_rpc_available(false);
        let store = InMemoryFeedStore::new().arc();

        let result = like_handler(&repo, &store)
            .handle(LikeNovel {
                novel_id: "a".to_string(),
                current_likes: 3,
                feed_id: None,
            })
            .await
            .unwrap();
        assert_eq!(result.likes, 4);
        assert_eq!(repo.get("a").unwrap().meta.likes, 4);
    }

    #[tokio::test]
    async fn test_double_like_through_feed_counts_once() {
        let repo = MemoryGalleryRepo::with_novels([novel("a", 3)]);
        let store = InMemoryFeedStore::new().arc();
        let events = EventPublisher::new().arc();
        let runner = FeedEffectRunner::new(repo.clone(), store.clone(), events);
        let feed_id = OpenFeedHandler::new(store.clone(), runner, 12)
            .handle(OpenFeed::default())
            .await
            .unwrap()
            .feed_id;
        let handler = like_handler(&repo, &store);

        let like = LikeNovel {
            novel_id: "a".to_string(),
            current_likes: 3,
            feed_id: Some(feed_id),
        };
        let first = handler.handle(like.clone()).await.unwrap();
        assert_eq!(first.likes, 4);
        let second = handler.handle(like).await.unwrap();
        assert_eq!(second.likes, 4);
        assert_eq!(repo.get("a").unwrap().meta.likes, 4);
    }

    #[tokio::test]
    async fn test_failed_like_restores_count() {
        let repo = MemoryGalleryRepo::with_novels([novel("a", 3)]);
        let store = InMemoryFeedStore::new().arc();
        let events = EventPublisher::new().arc();
        let runner = FeedEffectRunner::new(repo.clone(), store.clone(), events);
        let feed_id = OpenFeedHandler::new(store.clone(), runner, 12)
            .handle(OpenFeed::default())
            .await
            .unwrap()
            .feed_id;

        repo.set_offline(true);
        let result = like_handler(&repo, &store)
            .handle(LikeNovel {
                novel_id: "a".to_string(),
                current_likes: 3,
                feed_id: Some(feed_id.clone()),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ExternalServiceError(_))));

        let snapshot = store.snapshot(&feed_id).unwrap();
        assert_eq!(snapshot.novels[0].likes, 3);
        assert!(snapshot.liked_ids.is_empty());
    }

    /// 在点赞请求进行中切换信息流过滤条件的仓储
    struct FilterSwitchingRepo {
        inner: Arc<MemoryGalleryRepo>,
        store: Arc<InMemoryFeedStore>,
        feed_id: Mutex<Option<String>>,
        reject_likes: bool,
    }

    impl FilterSwitchingRepo {
        fn new(inner: Arc<MemoryGalleryRepo>, store: Arc<InMemoryFeedStore>, reject_likes: bool) -> Arc<Self> {
            Arc::new(Self {
                inner,
                store,
                feed_id: Mutex::new(None),
                reject_likes,
            })
        }

        fn switch_filter(&self) {
            if let Some(feed_id) = self.feed_id.lock().unwrap().clone() {
                let newest = GalleryFilter {
                    sort: GallerySort::Newest,
                    ..Default::default()
                };
                self.store
                    .dispatch(&feed_id, FeedAction::FilterChanged(newest))
                    .unwrap();
            }
        }

        fn rejected() -> RepositoryError {
            RepositoryError::Unavailable("like rejected".to_string())
        }
    }

    #[async_trait]
    impl GalleryRepositoryPort for FilterSwitchingRepo {
        async fn fetch_page(&self, query: &GalleryPageQuery) -> Result<Vec<GalleryNovel>, RepositoryError> {
            self.inner.fetch_page(query).await
        }

        async fn find_by_hash(&self, content_hash: &str) -> Result<Vec<HashMatch>, RepositoryError> {
            self.inner.find_by_hash(content_hash).await
        }

        async fn insert(&self, record: &GalleryRecord) -> Result<(), RepositoryError> {
            self.inner.insert(record).await
        }

        async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<(), RepositoryError> {
            self.inner.update_visibility(id, visibility).await
        }

        async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
            self.switch_filter();
            if self.reject_likes {
                return Err(Self::rejected());
            }
            self.inner.increment_likes(id).await
        }

        async fn set_likes(&self, id: &str, likes: i64) -> Result<(), RepositoryError> {
            if self.reject_likes {
                return Err(Self::rejected());
            }
            self.inner.set_likes(id, likes).await
        }

        async fn increment_downloads(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
            self.inner.increment_downloads(id).await
        }

        async fn set_downloads(&self, id: &str, downloads: i64) -> Result<(), RepositoryError> {
            self.inner.set_downloads(id, downloads).await
        }

        async fn find_record(&self, id: &str) -> Result<Option<GalleryRecord>, RepositoryError> {
            self.inner.find_record(id).await
        }

        async fn health_check(&self) -> Result<(), RepositoryError> {
            self.inner.health_check().await
        }
    }

    /// 打开信息流后，点赞请求期间切换过滤条件
    async fn like_during_filter_change(
        reject_likes: bool,
    ) -> (Arc<MemoryGalleryRepo>, Arc<InMemoryFeedStore>, String, Result<LikeNovelResponse, ApplicationError>) {
        let inner = MemoryGalleryRepo::with_novels([novel("a", 3)]);
        let store = InMemoryFeedStore::new().arc();
        let repo = FilterSwitchingRepo::new(inner.clone(), store.clone(), reject_likes);
        let events = EventPublisher::new().arc();
        let runner = FeedEffectRunner::new(repo.clone(), store.clone(), events.clone());

        let feed_id = OpenFeedHandler::new(store.clone(), runner.clone(), 12)
            .handle(OpenFeed::default())
            .await
            .unwrap()
            .feed_id;
        *repo.feed_id.lock().unwrap() = Some(feed_id.clone());

        let result = LikeNovelHandler::new(repo, runner, events)
            .handle(LikeNovel {
                novel_id: "a".to_string(),
                current_likes: 3,
                feed_id: Some(feed_id.clone()),
            })
            .await;
        (inner, store, feed_id, result)
    }

    #[tokio::test]
    async fn test_like_counts_once_when_feed_resets_mid_request() {
        let (repo, store, feed_id, result) = like_during_filter_change(false).await;

        assert_eq!(result.unwrap().likes, 4);
        assert_eq!(repo.get("a").unwrap().meta.likes, 4);

        let snapshot = store.snapshot(&feed_id).unwrap();
        assert!(snapshot.novels.is_empty());
        assert_eq!(snapshot.liked_ids, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_like_failure_reported_when_feed_resets_mid_request() {
        let (repo, store, feed_id, result) = like_during_filter_change(true).await;

        assert!(matches!(result, Err(ApplicationError::ExternalServiceError(_))));
        assert_eq!(repo.get("a").unwrap().meta.likes, 3);
        assert!(store.snapshot(&feed_id).unwrap().liked_ids.is_empty());
    }

    #[tokio::test]
    async fn test_import_assigns_new_id_and_counts_download() {
        let repo = MemoryGalleryRepo::with_novels([]);
        let published = publish_handler(&repo)
            .handle(publish("me", Visibility::Public))
            .await
            .unwrap();
        repo.set_rpc_available(false);

        let handler = ImportNovelHandler::new(
            repo.clone(),
            InMemoryFeedStore::new().arc(),
            EventPublisher::new().arc(),
        );
        let project = handler
            .handle(ImportNovel {
                novel_id: published.novel_id.clone(),
                feed_id: None,
            })
            .await
            .unwrap();

        let original = sample_project();
        let prefix: String = original.id.chars().take(5).collect();
        assert!(project.id.starts_with("imported_"));
        assert!(project.id.ends_with(&format!("_{prefix}")));
        assert_eq!(project.title, original.title);

        // 后台计数
        for _ in 0..50 {
            if repo.get(&published.novel_id).unwrap().meta.downloads == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(repo.get(&published.novel_id).unwrap().meta.downloads, 1);
    }

    #[tokio::test]
    async fn test_import_missing_novel() {
        let repo = MemoryGalleryRepo::with_novels([]);
        let handler = ImportNovelHandler::new(
            repo,
            InMemoryFeedStore::new().arc(),
            EventPublisher::new().arc(),
        );
        let result = handler
            .handle(ImportNovel {
                novel_id: "missing".to_string(),
                feed_id: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }
}
