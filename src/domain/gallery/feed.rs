//! 画廊信息流状态机
//!
//! 所有状态变更都经过 [`GalleryFeed::reduce`]，副作用（拉取分页、发送点赞）
//! 以 [`FeedEffect`] 返回给调用方执行，执行结果再作为 [`FeedAction`] 回灌。
//!
//! ```text
//! Idle --Open--> Loading(0) --PageLoaded--> Loaded --SentinelVisible--> Loading(n) --> Loaded
//!                     \--PageFailed--> Failed --SentinelVisible--> Loading(n)（重试同一页）
//! FilterChanged: 任意状态 --> Loading(0)，列表清空，generation + 1
//! ```

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::entities::{GalleryFilter, GalleryNovel, GalleryScope, DEFAULT_PAGE_SIZE};

/// 拉取失败时展示给用户的错误
pub const GALLERY_UNAVAILABLE: &str = "Unable to connect to Gallery. Please check settings.";

/// 排行榜展示条数
const TOP_LIST_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedStatus {
    Idle,
    Loading { page: usize },
    Loaded,
    Failed { page: usize, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    Open,
    FilterChanged(GalleryFilter),
    /// 列表底部哨兵进入视口
    SentinelVisible,
    PageLoaded {
        generation: u64,
        page: usize,
        rows: Vec<GalleryNovel>,
    },
    PageFailed {
        generation: u64,
        page: usize,
    },
    LikeOptimistic {
        id: String,
    },
    LikeConfirmed {
        id: String,
        likes: i64,
    },
    LikeFailed {
        id: String,
    },
    Downloaded {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEffect {
    Fetch {
        generation: u64,
        page: usize,
        filter: GalleryFilter,
        limit: usize,
    },
    /// current_likes 为乐观更新前的计数
    SendLike { id: String, current_likes: i64 },
}

/// 单个浏览会话的信息流
#[derive(Debug, Clone)]
pub struct GalleryFeed {
    filter: GalleryFilter,
    page_size: usize,
    novels: Vec<GalleryNovel>,
    page: usize,
    has_more: bool,
    status: FeedStatus,
    liked: HashSet<String>,
    /// id -> 乐观更新前的点赞数
    pending_likes: HashMap<String, i64>,
    generation: u64,
}

impl Default for GalleryFeed {
    fn default() -> Self {
        Self::new(GalleryFilter::default(), DEFAULT_PAGE_SIZE)
    }
}

impl GalleryFeed {
    pub fn new(filter: GalleryFilter, page_size: usize) -> Self {
        Self {
            filter,
            page_size: page_size.max(1),
            novels: Vec::new(),
            page: 0,
            has_more: true,
            status: FeedStatus::Idle,
            liked: HashSet::new(),
            pending_likes: HashMap::new(),
            generation: 0,
        }
    }

    pub fn filter(&self) -> &GalleryFilter {
        &self.filter
    }

    pub fn novels(&self) -> &[GalleryNovel] {
        &self.novels
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }

    pub fn find(&self, id: &str) -> Option<&GalleryNovel> {
        self.novels.iter().find(|n| n.id == id)
    }

    /// 处理一个动作，返回需要执行的副作用
    pub fn reduce(&mut self, action: FeedAction) -> Vec<FeedEffect> {
        match action {
            FeedAction::Open => {
                if self.status == FeedStatus::Idle {
                    self.reset()
                } else {
                    Vec::new()
                }
            }
            FeedAction::FilterChanged(filter) => {
                let failed = matches!(self.status, FeedStatus::Failed { .. });
                if filter == self.filter && self.status != FeedStatus::Idle && !failed {
                    return Vec::new();
                }
                self.filter = filter;
                self.reset()
            }
            FeedAction::SentinelVisible => self.load_more(),
            FeedAction::PageLoaded {
                generation,
                page,
                rows,
            } => {
                if !self.is_current(generation, page) {
                    return Vec::new();
                }
                self.apply_page(page, rows);
                Vec::new()
            }
            FeedAction::PageFailed { generation, page } => {
                if self.is_current(generation, page) {
                    self.status = FeedStatus::Failed {
                        page,
                        error: GALLERY_UNAVAILABLE.to_string(),
                    };
                }
                Vec::new()
            }
            FeedAction::LikeOptimistic { id } => self.like_optimistic(id),
            FeedAction::LikeConfirmed { id, likes } => {
                if self.pending_likes.remove(&id).is_some() {
                    if let Some(novel) = self.novels.iter_mut().find(|n| n.id == id) {
                        novel.likes = likes;
                    }
                }
                Vec::new()
            }
            FeedAction::LikeFailed { id } => {
                // 无论列表是否已重置，失败的点赞都不能保留已赞标记
                self.liked.remove(&id);
                if let Some(previous) = self.pending_likes.remove(&id) {
                    if let Some(novel) = self.novels.iter_mut().find(|n| n.id == id) {
                        novel.likes = previous;
                    }
                }
                Vec::new()
            }
            FeedAction::Downloaded { id } => {
                if let Some(novel) = self.novels.iter_mut().find(|n| n.id == id) {
                    novel.downloads += 1;
                }
                Vec::new()
            }
        }
    }

    fn reset(&mut self) -> Vec<FeedEffect> {
        self.generation += 1;
        self.novels.clear();
        self.page = 0;
        self.has_more = true;
        // 进行中的点赞跨越重置保留，等待确认或回滚
        self.fetch(0)
    }

    fn load_more(&mut self) -> Vec<FeedEffect> {
        match self.status {
            FeedStatus::Loaded if self.has_more => {
                self.page += 1;
                self.fetch(self.page)
            }
            FeedStatus::Failed { page, .. } if self.has_more => self.fetch(page),
            _ => Vec::new(),
        }
    }

    fn fetch(&mut self, page: usize) -> Vec<FeedEffect> {
        self.status = FeedStatus::Loading { page };
        vec![FeedEffect::Fetch {
            generation: self.generation,
            page,
            filter: self.filter.clone(),
            limit: self.page_size,
        }]
    }

    fn is_current(&self, generation: u64, page: usize) -> bool {
        generation == self.generation && self.status == FeedStatus::Loading { page }
    }

    fn apply_page(&mut self, page: usize, rows: Vec<GalleryNovel>) {
        if rows.len() < self.page_size {
            self.has_more = false;
        }

        if page == 0 {
            self.novels = rows;
        } else {
            let existing: HashSet<String> = self.novels.iter().map(|n| n.id.clone()).collect();
            self.novels
                .extend(rows.into_iter().filter(|n| !existing.contains(&n.id)));
        }
        self.page = page;
        self.status = FeedStatus::Loaded;
    }

    fn like_optimistic(&mut self, id: String) -> Vec<FeedEffect> {
        if self.liked.contains(&id) {
            return Vec::new();
        }
        let Some(novel) = self.novels.iter_mut().find(|n| n.id == id) else {
            return Vec::new();
        };

        let current_likes = novel.likes;
        novel.likes += 1;
        self.pending_likes.insert(id.clone(), current_likes);
        self.liked.insert(id.clone());

        vec![FeedEffect::SendLike { id, current_likes }]
    }

    // ========== 派生视图 ==========

    fn ranked(&self) -> Vec<&GalleryNovel> {
        let mut ranked: Vec<&GalleryNovel> = self.novels.iter().collect();
        // 稳定排序：点赞数相同时保持加载顺序
        ranked.sort_by(|a, b| b.likes.cmp(&a.likes));
        ranked
    }

    /// 当前已加载中点赞最多的作品（mine 范围不展示）
    pub fn featured(&self) -> Option<&GalleryNovel> {
        if self.filter.scope == GalleryScope::Mine {
            return None;
        }
        self.ranked().into_iter().next()
    }

    /// 紧随其后的排行榜
    pub fn top_list(&self) -> Vec<&GalleryNovel> {
        if self.filter.scope == GalleryScope::Mine || self.novels.len() < 2 {
            return Vec::new();
        }
        self.ranked()
            .into_iter()
            .skip(1)
            .take(TOP_LIST_LEN)
            .collect()
    }

    /// 网格区：除去推荐位的作品
    pub fn grid(&self) -> Vec<&GalleryNovel> {
        let featured_id = self.featured().map(|n| n.id.as_str());
        self.novels
            .iter()
            .filter(|n| Some(n.id.as_str()) != featured_id)
            .collect()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let mut liked: Vec<String> = self.liked.iter().cloned().collect();
        liked.sort();
        FeedSnapshot {
            filter: self.filter.clone(),
            novels: self.novels.clone(),
            page: self.page,
            has_more: self.has_more,
            status: self.status.clone(),
            liked_ids: liked,
            featured: self.featured().cloned(),
            top_list: self.top_list().into_iter().cloned().collect(),
            grid_ids: self.grid().into_iter().map(|n| n.id.clone()).collect(),
        }
    }
}

/// 信息流的可序列化视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub filter: GalleryFilter,
    pub novels: Vec<GalleryNovel>,
    pub page: usize,
    pub has_more: bool,
    pub status: FeedStatus,
    pub liked_ids: Vec<String>,
    pub featured: Option<GalleryNovel>,
    pub top_list: Vec<GalleryNovel>,
    pub grid_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gallery::{GallerySort, Visibility};

    fn novel(id: &str, likes: i64) -> GalleryNovel {
        GalleryNovel {
            id: id.to_string(),
            title: format!("Title {id}"),
            author: "Anon".to_string(),
            genre: "Fantasy".to_string(),
            subgenre: None,
            description: String::new(),
            word_count: 100,
            visibility: Visibility::Public,
            likes,
            downloads: 0,
            published_at: 0,
            tags: Vec::new(),
            content_hash: None,
            owner_id: None,
        }
    }

    fn rows(prefix: &str, n: usize) -> Vec<GalleryNovel> {
        (0..n).map(|i| novel(&format!("{prefix}{i}"), i as i64)).collect()
    }

    fn fetch_of(effects: &[FeedEffect]) -> (u64, usize) {
        match effects {
            [FeedEffect::Fetch {
                generation, page, ..
            }] => (*generation, *page),
            other => panic!("expected a single fetch, got {other:?}"),
        }
    }

    fn opened(page_size: usize) -> GalleryFeed {
        let mut feed = GalleryFeed::new(GalleryFilter::default(), page_size);
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::Open));
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: rows("a", page_size),
        });
        feed
    }

    #[test]
    fn test_open_fetches_first_page_once() {
        let mut feed = GalleryFeed::new(GalleryFilter::default(), 3);
        assert_eq!(fetch_of(&feed.reduce(FeedAction::Open)), (1, 0));
        assert_eq!(feed.status(), &FeedStatus::Loading { page: 0 });
        assert!(feed.reduce(FeedAction::Open).is_empty());
        // 加载中哨兵不触发
        assert!(feed.reduce(FeedAction::SentinelVisible).is_empty());
    }

    #[test]
    fn test_infinite_scroll_until_short_page() {
        let mut feed = opened(3);
        assert!(feed.has_more());

        let (generation, page) = fetch_of(&feed.reduce(FeedAction::SentinelVisible));
        assert_eq!(page, 1);
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: rows("b", 3),
        });
        assert!(feed.has_more());
        assert_eq!(feed.novels().len(), 6);

        let (generation, page) = fetch_of(&feed.reduce(FeedAction::SentinelVisible));
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: rows("c", 2),
        });
        assert!(!feed.has_more());
        assert_eq!(feed.novels().len(), 8);
        assert!(feed.reduce(FeedAction::SentinelVisible).is_empty());
    }

    #[test]
    fn test_full_page_keeps_has_more_and_empty_page_ends() {
        let mut feed = opened(2);
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::SentinelVisible));
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: Vec::new(),
        });
        assert!(!feed.has_more());
        assert_eq!(feed.page(), 1);
    }

    #[test]
    fn test_appended_duplicates_dropped() {
        let mut feed = opened(3);
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::SentinelVisible));
        let mut page_rows = rows("a", 1);
        page_rows.extend(rows("z", 2));
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: page_rows,
        });
        assert_eq!(feed.novels().len(), 5);
        assert!(feed.has_more());
    }

    #[test]
    fn test_filter_change_resets_and_ignores_stale_pages() {
        let mut feed = opened(3);
        let (old_generation, old_page) = fetch_of(&feed.reduce(FeedAction::SentinelVisible));

        let filter = GalleryFilter {
            scope: GalleryScope::Mine,
            ..Default::default()
        };
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::FilterChanged(filter.clone())));
        assert_eq!(page, 0);
        assert!(generation > old_generation);
        assert!(feed.novels().is_empty());
        assert!(feed.has_more());

        // 旧过滤条件的结果到达，忽略
        feed.reduce(FeedAction::PageLoaded {
            generation: old_generation,
            page: old_page,
            rows: rows("old", 3),
        });
        assert!(feed.novels().is_empty());

        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: rows("m", 1),
        });
        assert_eq!(feed.novels().len(), 1);
        assert_eq!(feed.filter(), &filter);

        // 相同过滤条件不重复拉取
        assert!(feed.reduce(FeedAction::FilterChanged(filter)).is_empty());
    }

    #[test]
    fn test_fetch_failure_sets_error_and_retries_same_page() {
        let mut feed = opened(3);
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::SentinelVisible));
        feed.reduce(FeedAction::PageFailed { generation, page });
        assert_eq!(
            feed.status(),
            &FeedStatus::Failed {
                page: 1,
                error: GALLERY_UNAVAILABLE.to_string()
            }
        );
        assert_eq!(fetch_of(&feed.reduce(FeedAction::SentinelVisible)).1, 1);
    }

    #[test]
    fn test_double_like_counts_once() {
        let mut feed = opened(3);
        let effects = feed.reduce(FeedAction::LikeOptimistic {
            id: "a2".to_string(),
        });
        assert_eq!(
            effects,
            vec![FeedEffect::SendLike {
                id: "a2".to_string(),
                current_likes: 2
            }]
        );
        assert!(feed
            .reduce(FeedAction::LikeOptimistic {
                id: "a2".to_string()
            })
            .is_empty());
        assert_eq!(feed.find("a2").unwrap().likes, 3);

        feed.reduce(FeedAction::LikeConfirmed {
            id: "a2".to_string(),
            likes: 3,
        });
        assert_eq!(feed.find("a2").unwrap().likes, 3);
        assert!(feed.is_liked("a2"));
    }

    #[test]
    fn test_failed_like_restores_count() {
        let mut feed = opened(3);
        feed.reduce(FeedAction::LikeOptimistic {
            id: "a1".to_string(),
        });
        assert_eq!(feed.find("a1").unwrap().likes, 2);

        feed.reduce(FeedAction::LikeFailed {
            id: "a1".to_string(),
        });
        assert_eq!(feed.find("a1").unwrap().likes, 1);
        assert!(!feed.is_liked("a1"));

        // 失败后允许再次点赞
        assert_eq!(
            feed.reduce(FeedAction::LikeOptimistic {
                id: "a1".to_string()
            })
            .len(),
            1
        );
    }

    fn newest() -> GalleryFilter {
        GalleryFilter {
            sort: GallerySort::Newest,
            ..Default::default()
        }
    }

    #[test]
    fn test_like_failed_after_filter_change_clears_liked() {
        let mut feed = opened(3);
        feed.reduce(FeedAction::LikeOptimistic {
            id: "a1".to_string(),
        });
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::FilterChanged(newest())));
        assert!(feed.is_liked("a1"));

        feed.reduce(FeedAction::LikeFailed {
            id: "a1".to_string(),
        });
        assert!(!feed.is_liked("a1"));
        assert!(feed.snapshot().liked_ids.is_empty());

        // 重新加载后可以再次点赞
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: rows("a", 3),
        });
        assert_eq!(
            feed.reduce(FeedAction::LikeOptimistic {
                id: "a1".to_string()
            }),
            vec![FeedEffect::SendLike {
                id: "a1".to_string(),
                current_likes: 1
            }]
        );
    }

    #[test]
    fn test_like_failed_restores_reloaded_row() {
        let mut feed = opened(3);
        feed.reduce(FeedAction::LikeOptimistic {
            id: "a2".to_string(),
        });
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::FilterChanged(newest())));
        // 新一页返回了乐观计数之前写入的服务端数据
        let mut reloaded = rows("a", 3);
        reloaded[2].likes = 3;
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: reloaded,
        });

        feed.reduce(FeedAction::LikeFailed {
            id: "a2".to_string(),
        });
        assert_eq!(feed.find("a2").unwrap().likes, 2);
        assert!(!feed.is_liked("a2"));
    }

    #[test]
    fn test_like_confirmed_after_filter_change() {
        let mut feed = opened(3);
        feed.reduce(FeedAction::LikeOptimistic {
            id: "a0".to_string(),
        });
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::FilterChanged(newest())));

        // 行尚未重新加载
        feed.reduce(FeedAction::LikeConfirmed {
            id: "a0".to_string(),
            likes: 1,
        });
        assert!(feed.is_liked("a0"));
        assert!(feed.novels().is_empty());

        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: rows("a", 3),
        });
        // 已确认的点赞不会再次发送
        assert!(feed
            .reduce(FeedAction::LikeOptimistic {
                id: "a0".to_string()
            })
            .is_empty());
    }

    #[test]
    fn test_like_unknown_row_is_noop() {
        let mut feed = opened(3);
        assert!(feed
            .reduce(FeedAction::LikeOptimistic {
                id: "missing".to_string()
            })
            .is_empty());
        assert!(!feed.is_liked("missing"));
    }

    #[test]
    fn test_downloaded_increments() {
        let mut feed = opened(3);
        feed.reduce(FeedAction::Downloaded {
            id: "a0".to_string(),
        });
        assert_eq!(feed.find("a0").unwrap().downloads, 1);
    }

    #[test]
    fn test_featured_and_top_list() {
        let mut feed = GalleryFeed::new(GalleryFilter::default(), 12);
        let (generation, page) = fetch_of(&feed.reduce(FeedAction::Open));
        feed.reduce(FeedAction::PageLoaded {
            generation,
            page,
            rows: vec![
                novel("x", 5),
                novel("y", 9),
                novel("z", 5),
                novel("w", 1),
                novel("v", 7),
            ],
        });

        assert_eq!(feed.featured().unwrap().id, "y");
        let top: Vec<&str> = feed.top_list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(top, vec!["v", "x", "z"]);
        assert_eq!(feed.grid().len(), 4);

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.featured.unwrap().id, "y");
        assert!(!snapshot.has_more);

        feed.reduce(FeedAction::FilterChanged(GalleryFilter {
            scope: GalleryScope::Mine,
            ..Default::default()
        }));
        assert!(feed.featured().is_none());
        assert!(feed.top_list().is_empty());
    }
}
