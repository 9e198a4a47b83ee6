//! In-Memory Feed Store Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{FeedEntry, FeedStoreError, FeedStorePort};
use crate::domain::gallery::{FeedAction, FeedEffect, FeedSnapshot};

/// 内存信息流存储
pub struct InMemoryFeedStore {
    feeds: DashMap<String, FeedEntry>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self {
            feeds: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryFeedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedStorePort for InMemoryFeedStore {
    fn create(&self, entry: FeedEntry) -> String {
        let feed_id = entry.id.clone();
        tracing::info!(feed_id = %feed_id, owner_id = %entry.owner_id, "Feed created");
        self.feeds.insert(feed_id.clone(), entry);
        feed_id
    }

    fn dispatch(
        &self,
        id: &str,
        action: FeedAction,
    ) -> Result<(Vec<FeedEffect>, FeedSnapshot), FeedStoreError> {
        // 持有条目写锁期间完成 reduce，同一信息流的动作串行执行
        let mut entry = self
            .feeds
            .get_mut(id)
            .ok_or_else(|| FeedStoreError::NotFound(id.to_string()))?;
        let effects = entry.feed.reduce(action);
        entry.last_activity = Utc::now();
        tracing::debug!(feed_id = %id, effects = effects.len(), "Feed action reduced");
        Ok((effects, entry.feed.snapshot()))
    }

    fn snapshot(&self, id: &str) -> Result<FeedSnapshot, FeedStoreError> {
        self.feeds
            .get(id)
            .map(|e| e.feed.snapshot())
            .ok_or_else(|| FeedStoreError::NotFound(id.to_string()))
    }

    fn owner_of(&self, id: &str) -> Result<String, FeedStoreError> {
        self.feeds
            .get(id)
            .map(|e| e.owner_id.clone())
            .ok_or_else(|| FeedStoreError::NotFound(id.to_string()))
    }

    fn close(&self, id: &str) -> Result<(), FeedStoreError> {
        self.feeds
            .remove(id)
            .map(|_| {
                tracing::info!(feed_id = %id, "Feed closed");
            })
            .ok_or_else(|| FeedStoreError::NotFound(id.to_string()))
    }

    fn get_expired(&self, idle_timeout_secs: u64) -> Vec<String> {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(idle_timeout_secs as i64);

        self.feeds
            .iter()
            .filter_map(|entry| {
                let elapsed = now - entry.last_activity;
                if elapsed > timeout {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn list_all(&self) -> Vec<String> {
        self.feeds.iter().map(|e| e.key().clone()).collect()
    }
}
