//! Gallery Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{FeedStorePort, GalleryRepositoryPort};
use crate::application::queries::{
    GalleryConnectionStatus, GalleryPageResponse, GetFeed, GetGalleryPage, ReadGalleryNovel,
    TestGalleryConnection,
};
use crate::domain::gallery::{FeedSnapshot, GalleryPageQuery, MAX_PAGE_SIZE};
use crate::domain::project::Project;

/// GetGalleryPage Handler - 无状态分页
pub struct GetGalleryPageHandler {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
    page_size: usize,
}

impl GetGalleryPageHandler {
    pub fn new(gallery_repo: Arc<dyn GalleryRepositoryPort>, page_size: usize) -> Self {
        Self {
            gallery_repo,
            page_size,
        }
    }

    pub async fn handle(&self, query: GetGalleryPage) -> Result<GalleryPageResponse, ApplicationError> {
        let limit = query.limit.unwrap_or(self.page_size).min(MAX_PAGE_SIZE);
        if limit == 0 {
            return Err(ApplicationError::validation("limit must be greater than 0"));
        }

        let page_query = GalleryPageQuery {
            filter: query.filter,
            page: query.page,
            limit,
            owner_id: query.owner_id,
        };
        if page_query.checked_offset().is_none() {
            return Err(ApplicationError::validation(format!(
                "page {} is out of range",
                query.page
            )));
        }
        let novels = self.gallery_repo.fetch_page(&page_query).await?;
        // 少于页大小即到底
        let has_more = novels.len() >= limit;

        Ok(GalleryPageResponse {
            novels,
            page: query.page,
            has_more,
        })
    }
}

/// ReadGalleryNovel Handler - 原样返回作品正文
pub struct ReadGalleryNovelHandler {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
}

impl ReadGalleryNovelHandler {
    pub fn new(gallery_repo: Arc<dyn GalleryRepositoryPort>) -> Self {
        Self { gallery_repo }
    }

    pub async fn handle(&self, query: ReadGalleryNovel) -> Result<Project, ApplicationError> {
        let record = self
            .gallery_repo
            .find_record(&query.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", query.novel_id))?;
        Ok(record.content)
    }
}

/// TestGalleryConnection Handler
pub struct TestGalleryConnectionHandler {
    gallery_repo: Arc<dyn GalleryRepositoryPort>,
}

impl TestGalleryConnectionHandler {
    pub fn new(gallery_repo: Arc<dyn GalleryRepositoryPort>) -> Self {
        Self { gallery_repo }
    }

    pub async fn handle(&self, _query: TestGalleryConnection) -> GalleryConnectionStatus {
        match self.gallery_repo.health_check().await {
            Ok(()) => GalleryConnectionStatus {
                connected: true,
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Gallery connection test failed");
                GalleryConnectionStatus {
                    connected: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// GetFeed Handler
pub struct GetFeedHandler {
    feed_store: Arc<dyn FeedStorePort>,
}

impl GetFeedHandler {
    pub fn new(feed_store: Arc<dyn FeedStorePort>) -> Self {
        Self { feed_store }
    }

    pub fn handle(&self, query: GetFeed) -> Result<FeedSnapshot, ApplicationError> {
        Ok(self.feed_store.snapshot(&query.feed_id)?)
    }
}
