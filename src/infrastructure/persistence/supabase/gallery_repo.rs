//! Supabase Gallery Repository
//!
//! 直接调用 PostgREST 接口：
//! - GET/POST/PATCH {url}/rest/v1/novels
//! - POST {url}/rest/v1/rpc/increment_likes | increment_downloads  {"row_id": ...}

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::application::ports::{GalleryRepositoryPort, RepositoryError};
use crate::domain::gallery::{
    GalleryNovel, GalleryPageQuery, GalleryRecord, GalleryScope, GallerySort, HashMatch,
    Visibility,
};
use crate::domain::project::Project;

const TABLE: &str = "novels";
const META_SELECT: &str = "id,title,author,genre,subgenre,description,word_count,visibility,\
     likes,downloads,published_at,tags,content_hash,owner_id";

/// Supabase 连接配置
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout_secs: 30,
        }
    }
}

/// 表中的一行（snake_case 列名）
#[derive(Debug, Serialize, Deserialize)]
struct NovelRow {
    id: String,
    title: String,
    author: String,
    genre: String,
    #[serde(default)]
    subgenre: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    word_count: u64,
    visibility: Visibility,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    downloads: i64,
    published_at: i64,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    content_hash: Option<String>,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
}

impl From<NovelRow> for GalleryNovel {
    fn from(row: NovelRow) -> Self {
        GalleryNovel {
            id: row.id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            subgenre: row.subgenre,
            description: row.description,
            word_count: row.word_count,
            visibility: row.visibility,
            likes: row.likes,
            downloads: row.downloads,
            published_at: row.published_at,
            tags: row.tags.unwrap_or_default(),
            content_hash: row.content_hash,
            owner_id: row.owner_id,
        }
    }
}

impl NovelRow {
    fn from_record(record: &GalleryRecord) -> Result<Self, RepositoryError> {
        let meta = &record.meta;
        let content = serde_json::to_value(&record.content)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        Ok(Self {
            id: meta.id.clone(),
            title: meta.title.clone(),
            author: meta.author.clone(),
            genre: meta.genre.clone(),
            subgenre: meta.subgenre.clone(),
            description: meta.description.clone(),
            word_count: meta.word_count,
            visibility: meta.visibility,
            likes: meta.likes,
            downloads: meta.downloads,
            published_at: meta.published_at,
            tags: Some(meta.tags.clone()),
            content_hash: meta.content_hash.clone(),
            owner_id: meta.owner_id.clone(),
            content: Some(content),
        })
    }

    fn into_record(mut self) -> Result<GalleryRecord, RepositoryError> {
        let content = self
            .content
            .take()
            .ok_or_else(|| RepositoryError::SerializationError("Missing content".to_string()))?;
        let content: Project = serde_json::from_value(content)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        Ok(GalleryRecord {
            meta: self.into(),
            content,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HashRow {
    id: String,
    #[serde(default)]
    owner_id: Option<String>,
    visibility: Visibility,
}

/// 分页查询参数（PostgREST 过滤语法）
fn page_params(query: &GalleryPageQuery) -> Vec<(&'static str, String)> {
    let filter = &query.filter;
    let mut params = vec![("select", META_SELECT.to_string())];

    match filter.scope {
        GalleryScope::Mine => params.push(("owner_id", format!("eq.{}", query.owner_id))),
        GalleryScope::Community => {
            params.push(("visibility", format!("eq.{}", Visibility::Public.as_str())))
        }
    }
    if let Some(genre) = filter.genre_filter() {
        params.push(("genre", format!("eq.{genre}")));
    }
    if let Some(search) = filter.search_filter() {
        params.push(("title", format!("ilike.*{search}*")));
    }
    params.push((
        "order",
        match filter.sort {
            GallerySort::Popular => "likes.desc".to_string(),
            GallerySort::Newest => "published_at.desc".to_string(),
        },
    ));
    params.push(("offset", query.offset().to_string()));
    params.push(("limit", query.limit.to_string()));
    params
}

/// Supabase Gallery Repository
///
/// 启动时创建一次，通过 AppState 注入
pub struct SupabaseGalleryRepository {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseGalleryRepository {
    pub fn new(config: SupabaseConfig) -> Result<Self, RepositoryError> {
        if config.url.trim().is_empty() || config.anon_key.trim().is_empty() {
            return Err(RepositoryError::Unavailable(
                "Supabase not configured".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), TABLE)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.config.url.trim_end_matches('/'), function)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    /// 发送请求并检查状态码
    async fn send(&self, builder: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::CONFLICT => RepositoryError::Duplicate(body),
            StatusCode::NOT_FOUND => RepositoryError::NotFound(body),
            _ => RepositoryError::DatabaseError(format!("HTTP {}: {}", status, body)),
        })
    }

    async fn rows<T: DeserializeOwned>(&self, response: Response) -> Result<Vec<T>, RepositoryError> {
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    async fn patch(&self, id: &str, body: Value) -> Result<(), RepositoryError> {
        self.send(
            self.client
                .patch(self.table_url())
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=minimal")
                .json(&body),
        )
        .await?;
        Ok(())
    }

    /// 调用自增 RPC；函数可能不返回值
    async fn rpc_increment(&self, function: &str, id: &str) -> Result<Option<i64>, RepositoryError> {
        let response = self
            .send(
                self.client
                    .post(self.rpc_url(function))
                    .json(&json!({ "row_id": id })),
            )
            .await?;
        let body = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<i64>(body.trim()).ok())
    }
}

#[async_trait]
impl GalleryRepositoryPort for SupabaseGalleryRepository {
    async fn fetch_page(&self, query: &GalleryPageQuery) -> Result<Vec<GalleryNovel>, RepositoryError> {
        let response = self
            .send(self.client.get(self.table_url()).query(&page_params(query)))
            .await?;
        let rows: Vec<NovelRow> = self.rows(response).await?;
        Ok(rows.into_iter().map(GalleryNovel::from).collect())
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Vec<HashMatch>, RepositoryError> {
        let response = self
            .send(self.client.get(self.table_url()).query(&[
                ("select", "id,owner_id,visibility".to_string()),
                ("content_hash", format!("eq.{content_hash}")),
            ]))
            .await?;
        let rows: Vec<HashRow> = self.rows(response).await?;
        Ok(rows
            .into_iter()
            .map(|r| HashMatch {
                id: r.id,
                owner_id: r.owner_id,
                visibility: r.visibility,
            })
            .collect())
    }

    async fn insert(&self, record: &GalleryRecord) -> Result<(), RepositoryError> {
        let row = NovelRow::from_record(record)?;
        self.send(
            self.client
                .post(self.table_url())
                .header("Prefer", "return=minimal")
                .json(&row),
        )
        .await?;
        tracing::debug!(novel_id = %record.meta.id, "Supabase row inserted");
        Ok(())
    }

    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<(), RepositoryError> {
        self.patch(id, json!({ "visibility": visibility })).await
    }

    async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        self.rpc_increment("increment_likes", id).await
    }

    async fn set_likes(&self, id: &str, likes: i64) -> Result<(), RepositoryError> {
        self.patch(id, json!({ "likes": likes })).await
    }

    async fn increment_downloads(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        self.rpc_increment("increment_downloads", id).await
    }

    async fn set_downloads(&self, id: &str, downloads: i64) -> Result<(), RepositoryError> {
        self.patch(id, json!({ "downloads": downloads })).await
    }

    async fn find_record(&self, id: &str) -> Result<Option<GalleryRecord>, RepositoryError> {
        let response = self
            .send(self.client.get(self.table_url()).query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{id}")),
            ]))
            .await?;
        let rows: Vec<NovelRow> = self.rows(response).await?;
        rows.into_iter().next().map(NovelRow::into_record).transpose()
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        self.send(
            self.client
                .get(self.table_url())
                .query(&[("select", "id"), ("limit", "1")])
                .timeout(Duration::from_secs(5)),
        )
        .await
        .map(|_| ())
        .map_err(|e| RepositoryError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gallery::GalleryFilter;
    use crate::domain::project::fixtures::sample_project;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_community_popular_params() {
        let query = GalleryPageQuery {
            filter: GalleryFilter {
                search: " crown ".to_string(),
                genre: "Fantasy".to_string(),
                ..Default::default()
            },
            page: 2,
            limit: 12,
            owner_id: "me".to_string(),
        };
        let params = page_params(&query);
        assert_eq!(param(&params, "visibility"), Some("eq.public"));
        assert_eq!(param(&params, "owner_id"), None);
        assert_eq!(param(&params, "genre"), Some("eq.Fantasy"));
        assert_eq!(param(&params, "title"), Some("ilike.*crown*"));
        assert_eq!(param(&params, "order"), Some("likes.desc"));
        assert_eq!(param(&params, "offset"), Some("24"));
        assert_eq!(param(&params, "limit"), Some("12"));
    }

    #[test]
    fn test_mine_newest_params() {
        let query = GalleryPageQuery {
            filter: GalleryFilter {
                scope: GalleryScope::Mine,
                sort: GallerySort::Newest,
                ..Default::default()
            },
            page: 0,
            limit: 12,
            owner_id: "me".to_string(),
        };
        let params = page_params(&query);
        assert_eq!(param(&params, "owner_id"), Some("eq.me"));
        assert_eq!(param(&params, "visibility"), None);
        assert_eq!(param(&params, "genre"), None);
        assert_eq!(param(&params, "order"), Some("published_at.desc"));
    }

    #[test]
    fn test_row_roundtrip_and_null_tags() {
        let record = GalleryRecord::from_project(
            "n1".to_string(),
            &sample_project(),
            "h".to_string(),
            Visibility::Public,
            "me".to_string(),
            5,
        );
        let value = serde_json::to_value(NovelRow::from_record(&record).unwrap()).unwrap();
        assert_eq!(value["word_count"], 7);
        assert_eq!(value["content"]["contentHash"], "h");

        let row: NovelRow = serde_json::from_value(value).unwrap();
        assert_eq!(row.into_record().unwrap(), record);

        let row: NovelRow = serde_json::from_value(json!({
            "id": "x", "title": "t", "author": "a", "genre": "g",
            "visibility": "private", "published_at": 1, "tags": null
        }))
        .unwrap();
        let novel = GalleryNovel::from(row);
        assert!(novel.tags.is_empty());
        assert_eq!(novel.visibility, Visibility::Private);
    }

    #[test]
    fn test_requires_configuration() {
        assert!(matches!(
            SupabaseGalleryRepository::new(SupabaseConfig::new("", "")),
            Err(RepositoryError::Unavailable(_))
        ));
    }
}
