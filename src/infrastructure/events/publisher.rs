//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::gallery::{FeedSnapshot, Visibility};

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 信息流状态变更（异步点赞确认、导入计数等）
    FeedUpdated {
        feed_id: String,
        snapshot: Box<FeedSnapshot>,
    },
    /// 信息流关闭
    FeedClosed { feed_id: String, reason: String },
    /// 作品发布（全局广播）
    NovelPublished {
        novel_id: String,
        title: String,
        visibility: Visibility,
    },
    /// 点赞确认（全局广播）
    NovelLiked { novel_id: String, likes: i64 },
    /// 作品被导入（全局广播）
    NovelImported { novel_id: String },
}

/// 事件发布器
pub struct EventPublisher {
    /// feed_id -> broadcast sender (for feed-specific events)
    feed_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// Global broadcast channel for novel events
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            feed_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册信息流的事件通道
    pub fn register_feed(&self, feed_id: &str) -> broadcast::Receiver<WsEvent> {
        if let Some(sender) = self.feed_channels.get(feed_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(100);
        self.feed_channels.insert(feed_id.to_string(), tx);
        rx
    }

    /// 取消注册信息流
    pub fn unregister_feed(&self, feed_id: &str) {
        self.feed_channels.remove(feed_id);
    }

    /// 发布信息流最新视图
    pub fn publish_feed_updated(&self, feed_id: &str, snapshot: FeedSnapshot) {
        self.publish_to_feed(
            feed_id,
            WsEvent::FeedUpdated {
                feed_id: feed_id.to_string(),
                snapshot: Box::new(snapshot),
            },
        );
    }

    /// 发布信息流关闭事件
    pub fn publish_feed_closed(&self, feed_id: &str, reason: &str) {
        self.publish_to_feed(
            feed_id,
            WsEvent::FeedClosed {
                feed_id: feed_id.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    /// 发布作品发布事件（全局广播）
    pub fn publish_novel_published(&self, novel_id: &str, title: &str, visibility: Visibility) {
        let event = WsEvent::NovelPublished {
            novel_id: novel_id.to_string(),
            title: title.to_string(),
            visibility,
        };
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                novel_id = %novel_id,
                error = %e,
                "Failed to publish NovelPublished event (no receivers)"
            );
        }
    }

    /// 发布点赞事件（全局广播）
    pub fn publish_novel_liked(&self, novel_id: &str, likes: i64) {
        let event = WsEvent::NovelLiked {
            novel_id: novel_id.to_string(),
            likes,
        };
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                novel_id = %novel_id,
                error = %e,
                "Failed to publish NovelLiked event (no receivers)"
            );
        }
    }

    /// 发布导入事件（全局广播）
    pub fn publish_novel_imported(&self, novel_id: &str) {
        let event = WsEvent::NovelImported {
            novel_id: novel_id.to_string(),
        };
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                novel_id = %novel_id,
                error = %e,
                "Failed to publish NovelImported event (no receivers)"
            );
        }
    }

    /// 发布事件到指定信息流
    fn publish_to_feed(&self, feed_id: &str, event: WsEvent) {
        if let Some(sender) = self.feed_channels.get(feed_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    feed_id = %feed_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
