//! Feed Command Handlers
//!
//! 信息流状态只在 reducer 中变更；这里负责执行 reducer 返回的副作用，
//! 并把执行结果作为新的动作回灌。

use std::sync::Arc;

use crate::application::commands::{ChangeFeedFilter, CloseFeed, LoadMoreFeed, OpenFeed};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    FeedEntry, FeedStorePort, GalleryRepositoryPort, RepositoryError,
};
use crate::domain::gallery::{FeedAction, FeedEffect, FeedSnapshot, GalleryFeed, GalleryPageQuery};
use crate::infrastructure::events::EventPublisher;

/// 点赞：先走原子自增，失败时手动写入 current + 1
pub async fn send_like(
    repo: &dyn GalleryRepositoryPort,
    novel_id: &str,
    current_likes: i64,
) -> Result<i64, RepositoryError> {
    match repo.increment_likes(novel_id).await {
        Ok(Some(likes)) => Ok(likes),
        Ok(None) => Ok(current_likes + 1),
        Err(e) => {
            tracing::warn!(
                novel_id = %novel_id,
                error = %e,
                "increment_likes failed, falling back to manual update"
            );
            repo.set_likes(novel_id, current_likes + 1).await?;
            Ok(current_likes + 1)
        }
    }
}

// ============================================================================
// FeedEffectRunner
// ============================================================================

/// 执行信息流副作用
#[derive(Clone)]
pub struct FeedEffectRunner {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
    feed_store: Arc<dyn FeedStorePort>,
    event_publisher: Arc<EventPublisher>,
}

impl FeedEffectRunner {
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

    /// 投递动作并执行其副作用，返回最终视图
    pub async fn dispatch(
        &self,
        feed_id: &str,
        action: FeedAction,
    ) -> Result<FeedSnapshot, ApplicationError> {
        Ok(self.dispatch_with_outcomes(feed_id, action).await?.0)
    }

    /// 同 [`dispatch`](Self::dispatch)，另外返回副作用执行后回灌给 reducer 的动作
    pub async fn dispatch_with_outcomes(
        &self,
        feed_id: &str,
        action: FeedAction,
    ) -> Result<(FeedSnapshot, Vec<FeedAction>), ApplicationError> {
        let (effects, snapshot) = self.feed_store.dispatch(feed_id, action)?;
        if effects.is_empty() {
            return Ok((snapshot, Vec::new()));
        }
        self.run_with_outcomes(feed_id, effects).await
    }

    /// 依次执行副作用（执行结果可能再产生新的副作用）
    async fn run_with_outcomes(
        &self,
        feed_id: &str,
        effects: Vec<FeedEffect>,
    ) -> Result<(FeedSnapshot, Vec<FeedAction>), ApplicationError> {
        let mut pending = effects;
        let mut snapshot = self.feed_store.snapshot(feed_id)?;
        let mut outcomes = Vec::new();

        while !pending.is_empty() {
            let mut next = Vec::new();
            for effect in pending {
                let action = self.execute(feed_id, effect).await?;
                let (effects, latest) = self.feed_store.dispatch(feed_id, action.clone())?;
                outcomes.push(action);
                next.extend(effects);
                snapshot = latest;
            }
            pending = next;
        }

        self.event_publisher
            .publish_feed_updated(feed_id, snapshot.clone());
        Ok((snapshot, outcomes))
    }

    async fn execute(
        &self,
        feed_id: &str,
        effect: FeedEffect,
    ) -> Result<FeedAction, ApplicationError> {
        match effect {
            FeedEffect::Fetch {
                generation,
                page,
                filter,
                limit,
            } => {
                let query = GalleryPageQuery {
                    filter,
                    page,
                    limit,
                    owner_id: self.feed_store.owner_of(feed_id)?,
                };
                match self.gallery_repo.fetch_page(&query).await {
                    Ok(rows) => {
                        tracing::debug!(
                            feed_id = %feed_id,
                            page = page,
                            rows = rows.len(),
                            "Gallery page fetched"
                        );
                        Ok(FeedAction::PageLoaded {
                            generation,
                            page,
                            rows,
                        })
                    }
                    Err(e) => {
                        tracing::error!(
                            feed_id = %feed_id,
                            page = page,
                            error = %e,
                            "Gallery page fetch failed"
                        );
                        Ok(FeedAction::PageFailed { generation, page })
                    }
                }
            }
            FeedEffect::SendLike { id, current_likes } => {
                match send_like(self.gallery_repo.as_ref(), &id, current_likes).await {
                    Ok(likes) => {
                        self.event_publisher.publish_novel_liked(&id, likes);
                        Ok(FeedAction::LikeConfirmed { id, likes })
                    }
                    Err(e) => {
                        tracing::error!(novel_id = %id, error = %e, "Like failed, rolling back");
                        Ok(FeedAction::LikeFailed { id })
                    }
                }
            }
        }
    }
}

// ============================================================================
// OpenFeed
// ============================================================================

pub struct OpenFeedHandler {
    feed_store: Arc<dyn FeedStorePort>,
    runner: FeedEffectRunner,
    page_size: usize,
}

/// 新建信息流的结果
#[derive(Debug, Clone)]
pub struct OpenFeedResponse {
    pub feed_id: String,
    pub snapshot: FeedSnapshot,
}

impl OpenFeedHandler {
    pub fn new(feed_store: Arc<dyn FeedStorePort>, runner: FeedEffectRunner, page_size: usize) -> Self {
        Self {
            feed_store,
            runner,
            page_size,
        }
    }

    pub async fn handle(&self, command: OpenFeed) -> Result<OpenFeedResponse, ApplicationError> {
        let feed = GalleryFeed::new(command.filter, self.page_size);
        let feed_id = self
            .feed_store
            .create(FeedEntry::new(command.owner_id, feed));

        let snapshot = self.runner.dispatch(&feed_id, FeedAction::Open).await?;
        Ok(OpenFeedResponse { feed_id, snapshot })
    }
}

// ============================================================================
// LoadMoreFeed / ChangeFeedFilter
// ============================================================================

pub struct LoadMoreFeedHandler {
    runner: FeedEffectRunner,
}

impl LoadMoreFeedHandler {
    pub fn new(runner: FeedEffectRunner) -> Self {
        Self { runner }
    }

    /// 哨兵可见：加载下一页（或重试失败页）
    pub async fn handle(&self, command: LoadMoreFeed) -> Result<FeedSnapshot, ApplicationError> {
        self.runner
            .dispatch(&command.feed_id, FeedAction::SentinelVisible)
            .await
    }
}

pub struct ChangeFeedFilterHandler {
    runner: FeedEffectRunner,
}

impl ChangeFeedFilterHandler {
    pub fn new(runner: FeedEffectRunner) -> Self {
        Self { runner }
    }

    pub async fn handle(&self, command: ChangeFeedFilter) -> Result<FeedSnapshot, ApplicationError> {
        self.runner
            .dispatch(&command.feed_id, FeedAction::FilterChanged(command.filter))
            .await
    }
}

// ============================================================================
// CloseFeed
// ============================================================================

pub struct CloseFeedHandler {
    feed_store: Arc<dyn FeedStorePort>,
    event_publisher: Arc<EventPublisher>,
}

impl CloseFeedHandler {
    pub fn new(feed_store: Arc<dyn FeedStorePort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            feed_store,
            event_publisher,
        }
    }

    pub fn handle(&self, command: CloseFeed) -> Result<(), ApplicationError> {
        self.close(&command.feed_id, "closed")
    }

    /// 关闭并通知订阅方（也用于过期清理）
    pub fn close(&self, feed_id: &str, reason: &str) -> Result<(), ApplicationError> {
        self.feed_store.close(feed_id)?;
        self.event_publisher.publish_feed_closed(feed_id, reason);
        self.event_publisher.unregister_feed(feed_id);
        Ok(())
    }

    /// 关闭所有空闲超时的信息流，返回关闭数量
    pub fn close_expired(&self, idle_timeout_secs: u64) -> usize {
        let expired = self.feed_store.get_expired(idle_timeout_secs);
        let count = expired
            .iter()
            .filter(|id| self.close(id, "expired").is_ok())
            .count();
        if count > 0 {
            tracing::info!(count = count, "Expired feeds closed");
        }
        count
    }
}
