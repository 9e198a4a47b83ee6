//! Gallery Context - Entities

use serde::{Deserialize, Serialize};

use crate::domain::project::Project;

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// 单页最多条数
pub const MAX_PAGE_SIZE: usize = 100;

/// 未填写题材时的默认值
pub const DEFAULT_GENRE: &str = "Fiction";

/// 首场景无摘要时的描述
pub const NO_DESCRIPTION: &str = "No description provided.";

/// 表示不按题材过滤
pub const ALL_GENRES: &str = "All";

/// 作品可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 画廊作品元数据（卡片展示用，不含正文）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryNovel {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgenre: Option<String>,
    pub description: String,
    pub word_count: u64,
    pub visibility: Visibility,
    pub likes: i64,
    pub downloads: i64,
    /// 毫秒时间戳
    pub published_at: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// 画廊中的完整记录（元数据 + 正文）
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryRecord {
    pub meta: GalleryNovel,
    /// 带 contentHash 的完整作品
    pub content: Project,
}

impl GalleryRecord {
    /// 由作品构建发布记录，计数清零
    pub fn from_project(
        id: String,
        project: &Project,
        content_hash: String,
        visibility: Visibility,
        owner_id: String,
        now_ms: i64,
    ) -> Self {
        let meta = GalleryNovel {
            id,
            title: project.title.clone(),
            author: project.author.clone(),
            genre: project
                .genre
                .clone()
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| DEFAULT_GENRE.to_string()),
            subgenre: project.subgenre.clone(),
            description: project
                .first_scene_summary()
                .filter(|s| !s.is_empty())
                .unwrap_or(NO_DESCRIPTION)
                .to_string(),
            word_count: project.word_count() as u64,
            visibility,
            likes: 0,
            downloads: 0,
            published_at: now_ms,
            tags: Vec::new(),
            content_hash: Some(content_hash.clone()),
            owner_id: Some(owner_id),
        };

        let mut content = project.clone();
        content.content_hash = Some(content_hash);

        Self { meta, content }
    }
}

/// 按内容哈希查到的已有记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashMatch {
    pub id: String,
    pub owner_id: Option<String>,
    pub visibility: Visibility,
}

/// 排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GallerySort {
    Newest,
    #[default]
    Popular,
}

/// 浏览范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryScope {
    #[default]
    Community,
    Mine,
}

/// 画廊过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryFilter {
    pub search: String,
    /// `All` 或具体题材
    pub genre: String,
    pub sort: GallerySort,
    pub scope: GalleryScope,
}

impl Default for GalleryFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            genre: ALL_GENRES.to_string(),
            sort: GallerySort::Popular,
            scope: GalleryScope::Community,
        }
    }
}

impl GalleryFilter {
    /// 需要按题材过滤时返回题材
    pub fn genre_filter(&self) -> Option<&str> {
        let genre = self.genre.trim();
        if genre.is_empty() || genre == ALL_GENRES {
            None
        } else {
            Some(genre)
        }
    }

    pub fn search_filter(&self) -> Option<&str> {
        let search = self.search.trim();
        if search.is_empty() {
            None
        } else {
            Some(search)
        }
    }
}

/// 一次分页查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryPageQuery {
    pub filter: GalleryFilter,
    /// 从 0 开始
    pub page: usize,
    pub limit: usize,
    /// mine 范围下的所有者
    pub owner_id: String,
}

impl GalleryPageQuery {
    /// 偏移量；乘积溢出或超出数据库整数范围时为 None
    pub fn checked_offset(&self) -> Option<usize> {
        self.page
            .checked_mul(self.limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.limit)
    }
}

/// 导入后的新作品 id
pub fn imported_project_id(original_id: &str, now_ms: i64) -> String {
    let prefix: String = original_id.chars().take(5).collect();
    format!("imported_{now_ms}_{prefix}")
}
