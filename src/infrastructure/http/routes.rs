//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                          GET   健康检查
//! - /api/ai/continue                   POST  普通续写
//! - /api/ai/smart_continue             POST  智能续写（动作 + JSON 生成）
//! - /api/ai/decide                     POST  动作判定
//! - /api/ai/chat                       POST  与 Codex 对话
//! - /api/ai/codex_entry                POST  生成 Codex 条目描述
//! - /api/ai/scan_codex                 POST  扫描正文中的新实体
//! - /api/ai/opening                    POST  生成开篇
//! - /api/ai/image_prompt               POST  生成配图提示词
//! - /api/ai/image                      POST  生成配图
//! - /api/reader/paginate               POST  正文分页
//! - /api/reader/highlight              POST  Codex 高亮区间
//! - /api/project/stats                 POST  字数 / 章节数 / 内容哈希
//! - /api/project/pacing                POST  节奏提示预览
//! - /api/project/snapshot/create       POST  创建快照
//! - /api/project/snapshot/restore      POST  恢复快照
//! - /api/project/snapshot/delete       POST  删除快照
//! - /api/project/snapshot/list         POST  快照列表（新到旧）
//! - /api/gallery/page                  POST  无状态分页
//! - /api/gallery/status                GET   连接测试
//! - /api/gallery/read                  POST  在线阅读
//! - /api/gallery/publish               POST  发布
//! - /api/gallery/like                  POST  点赞
//! - /api/gallery/import                POST  导入为本地作品
//! - /api/feed/open                     POST  打开信息流
//! - /api/feed/more                     POST  加载下一页
//! - /api/feed/filter                   POST  修改过滤条件
//! - /api/feed/get                      POST  当前视图
//! - /api/feed/close                    POST  关闭信息流
//! - /api/identity                      GET   当前所有者 id
//! - /api/identity/set                  POST  指定所有者 id
//! - /ws/feed/{feed_id}                 WS    信息流状态推送
//! - /ws/events                         WS    全局作品事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/feed/:feed_id", get(handlers::feed_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/ai", ai_routes())
        .nest("/reader", reader_routes())
        .nest("/project", project_routes())
        .nest("/gallery", gallery_routes())
        .nest("/feed", feed_routes())
        .route("/identity", get(handlers::get_identity))
        .route("/identity/set", post(handlers::set_identity))
}

/// AI 路由
fn ai_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/continue", post(handlers::continue_story))
        .route("/smart_continue", post(handlers::smart_continue))
        .route("/decide", post(handlers::decide_action))
        .route("/chat", post(handlers::chat))
        .route("/codex_entry", post(handlers::generate_codex_entry))
        .route("/scan_codex", post(handlers::scan_codex))
        .route("/opening", post(handlers::generate_opening))
        .route("/image_prompt", post(handlers::generate_image_prompt))
        .route("/image", post(handlers::generate_image))
}

/// Reader 路由
fn reader_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/paginate", post(handlers::paginate))
        .route("/highlight", post(handlers::highlight))
}

/// Project 路由
fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", post(handlers::project_stats))
        .route("/pacing", post(handlers::preview_pacing))
        .route("/snapshot/create", post(handlers::create_snapshot))
        .route("/snapshot/restore", post(handlers::restore_snapshot))
        .route("/snapshot/delete", post(handlers::delete_snapshot))
        .route("/snapshot/list", post(handlers::list_snapshots))
}

/// Gallery 路由
fn gallery_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/page", post(handlers::gallery_page))
        .route("/status", get(handlers::gallery_status))
        .route("/read", post(handlers::read_novel))
        .route("/publish", post(handlers::publish_novel))
        .route("/like", post(handlers::like_novel))
        .route("/import", post(handlers::import_novel))
}

/// Feed 路由
fn feed_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/open", post(handlers::open_feed))
        .route("/more", post(handlers::load_more))
        .route("/filter", post(handlers::change_filter))
        .route("/get", post(handlers::get_feed))
        .route("/close", post(handlers::close_feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::application::commands::handlers::test_support::{novel, MemoryGalleryRepo};
    use crate::application::{AiProviderRegistry, IdentityPort, ImageGeneratorRegistry};
    use crate::domain::project::fixtures::sample_project;
    use crate::domain::reader::PageLayout;
    use crate::infrastructure::adapters::ScriptedAiClient;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::identity::FileIdentityStore;
    use crate::infrastructure::memory::InMemoryFeedStore;

    struct TestApp {
        router: Router,
        ai: Arc<ScriptedAiClient>,
        repo: Arc<MemoryGalleryRepo>,
        _dir: tempfile::TempDir,
    }

    fn app_with(novels: Vec<crate::domain::gallery::GalleryNovel>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let identity = FileIdentityStore::open(dir.path().join("owner_id")).unwrap();
        identity.set_owner_id("local-owner").unwrap();

        let ai = Arc::new(ScriptedAiClient::new(""));
        let repo = MemoryGalleryRepo::with_novels(novels);
        let state = AppState::new(
            AiProviderRegistry::single(ai.clone()),
            ImageGeneratorRegistry::new(ai.clone(), ai.clone()),
            repo.clone(),
            InMemoryFeedStore::new().arc(),
            Arc::new(identity),
            EventPublisher::new().arc(),
            2,
            PageLayout::default(),
        );

        TestApp {
            router: create_routes().with_state(Arc::new(state)),
            ai,
            repo,
            _dir: dir,
        }
    }

    async fn call(router: &Router, request: Request<Body>) -> Value {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let app = app_with(vec![]);
        let request = Request::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();
        let json = call(&app.router, request).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["openFeeds"], 0);
    }

    #[tokio::test]
    async fn test_smart_continue_recovers_truncated_json() {
        let app = app_with(vec![]);
        app.ai.push_reply("new_scene");
        app.ai
            .push_reply(r#"{"action":"new_scene","title":"Dawn","content":"The gates opened"#);

        let json = call(
            &app.router,
            post_json("/api/ai/smart_continue", json!({ "text": "Night fell." })),
        )
        .await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["action"], "new_scene");
        assert_eq!(json["data"]["content"], "The gates opened");
    }

    #[tokio::test]
    async fn test_paginate_and_stats() {
        let app = app_with(vec![]);
        let json = call(
            &app.router,
            post_json("/api/reader/paginate", json!({ "text": "One.\n\n\nTwo." })),
        )
        .await;
        assert_eq!(json["data"]["pageCount"], 1);
        assert_eq!(json["data"]["pages"][0], "One.\n\nTwo.");

        let json = call(
            &app.router,
            post_json("/api/project/stats", json!({ "project": sample_project() })),
        )
        .await;
        assert_eq!(json["data"]["wordCount"], 7);
        assert_eq!(json["data"]["contentHash"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_publish_uses_owner_header() {
        let app = app_with(vec![]);
        let body = json!({ "project": sample_project(), "visibility": "private" });

        let first = call(&app.router, post_json("/api/gallery/publish", body.clone())).await;
        assert_eq!(first["data"]["created"], true);

        // 同一所有者重复发布：幂等
        let again = call(&app.router, post_json("/api/gallery/publish", body.clone())).await;
        assert_eq!(again["data"]["created"], false);
        assert_eq!(again["data"]["novelId"], first["data"]["novelId"]);

        // 其他所有者发布相同内容：冲突
        let mut request = post_json("/api/gallery/publish", body);
        request
            .headers_mut()
            .insert("x-owner-id", "someone-else".parse().unwrap());
        let conflict = call(&app.router, request).await;
        assert_eq!(conflict["errno"], 409);
        assert_eq!(app.repo.len(), 1);
    }

    #[tokio::test]
    async fn test_feed_open_scroll_and_like() {
        let app = app_with(vec![novel("a", 5), novel("b", 3), novel("c", 1)]);

        let opened = call(&app.router, post_json("/api/feed/open", json!({}))).await;
        let feed_id = opened["data"]["feedId"].as_str().unwrap().to_string();
        assert_eq!(opened["data"]["snapshot"]["novels"].as_array().unwrap().len(), 2);
        assert_eq!(opened["data"]["snapshot"]["hasMore"], true);

        let more = call(
            &app.router,
            post_json("/api/feed/more", json!({ "feedId": feed_id })),
        )
        .await;
        assert_eq!(more["data"]["novels"].as_array().unwrap().len(), 3);
        assert_eq!(more["data"]["hasMore"], false);

        let liked = call(
            &app.router,
            post_json("/api/gallery/like", json!({ "novelId": "b", "feedId": feed_id })),
        )
        .await;
        assert_eq!(liked["data"]["likes"], 4);
        assert_eq!(app.repo.get("b").unwrap().meta.likes, 4);

        let closed = call(
            &app.router,
            post_json("/api/feed/close", json!({ "feedId": feed_id })),
        )
        .await;
        assert_eq!(closed["errno"], 0);

        let gone = call(
            &app.router,
            post_json("/api/feed/get", json!({ "feedId": feed_id })),
        )
        .await;
        assert_eq!(gone["errno"], 404);
    }

    #[tokio::test]
    async fn test_identity_roundtrip() {
        let app = app_with(vec![]);
        let request = Request::builder()
            .uri("/api/identity")
            .body(Body::empty())
            .unwrap();
        let json = call(&app.router, request).await;
        assert_eq!(json["data"]["ownerId"], "local-owner");

        let json = call(
            &app.router,
            post_json("/api/identity/set", json!({ "ownerId": "has space" })),
        )
        .await;
        assert_eq!(json["errno"], 400);
    }
}
