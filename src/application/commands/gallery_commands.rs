//! Gallery Commands

use crate::domain::gallery::{GalleryFilter, Visibility};
use crate::domain::project::Project;

/// 发布作品到画廊
#[derive(Debug, Clone)]
pub struct PublishNovel {
    pub project: Project,
    pub visibility: Visibility,
    pub owner_id: String,
}

/// 点赞
#[derive(Debug, Clone)]
pub struct LikeNovel {
    pub novel_id: String,
    /// 客户端看到的当前点赞数（无信息流时使用）
    pub current_likes: i64,
    /// 指定时通过该信息流做乐观更新
    pub feed_id: Option<String>,
}

/// 导入画廊作品为本地作品
#[derive(Debug, Clone)]
pub struct ImportNovel {
    pub novel_id: String,
    /// 指定时同步更新该信息流中的下载数
    pub feed_id: Option<String>,
}

/// 打开信息流
#[derive(Debug, Clone, Default)]
pub struct OpenFeed {
    pub filter: GalleryFilter,
    pub owner_id: String,
}

/// 加载下一页
#[derive(Debug, Clone)]
pub struct LoadMoreFeed {
    pub feed_id: String,
}

/// 修改过滤条件或范围
#[derive(Debug, Clone)]
pub struct ChangeFeedFilter {
    pub feed_id: String,
    pub filter: GalleryFilter,
}

/// 关闭信息流
#[derive(Debug, Clone)]
pub struct CloseFeed {
    pub feed_id: String,
}
