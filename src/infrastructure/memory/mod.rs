//! Memory Layer - In-Memory State Management
//!
//! 实现 FeedStore，管理画廊信息流的内存状态

mod feed_store;

pub use feed_store::InMemoryFeedStore;
