//! Gallery Context - 社区画廊
//!
//! 职责:
//! - 画廊作品元数据与过滤条件
//! - 信息流状态机（无限滚动、乐观点赞）

mod entities;
pub mod feed;

pub use entities::{
    imported_project_id, GalleryFilter, GalleryNovel, GalleryPageQuery, GalleryRecord, GalleryScope,
    GallerySort, HashMatch, Visibility, ALL_GENRES, DEFAULT_GENRE,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, NO_DESCRIPTION,
};
pub use feed::{FeedAction, FeedEffect, FeedSnapshot, FeedStatus, GalleryFeed, GALLERY_UNAVAILABLE};
