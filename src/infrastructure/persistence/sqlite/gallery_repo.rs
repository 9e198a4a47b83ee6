//! SQLite Gallery Repository

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::DbPool;
use crate::application::ports::{GalleryRepositoryPort, RepositoryError};
use crate::domain::gallery::{
    GalleryNovel, GalleryPageQuery, GalleryRecord, GalleryScope, GallerySort, HashMatch,
    Visibility,
};
use crate::domain::project::Project;

const META_COLUMNS: &str = "id, title, author, genre, subgenre, description, word_count, visibility, \
     likes, downloads, published_at, tags, content_hash, owner_id";

/// SQLite Gallery Repository
pub struct SqliteGalleryRepository {
    pool: DbPool,
}

impl SqliteGalleryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

fn serde_err(e: serde_json::Error) -> RepositoryError {
    RepositoryError::SerializationError(e.to_string())
}

/// LIKE 通配符转义（配合 ESCAPE '\'）
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(FromRow)]
struct NovelRow {
    id: String,
    title: String,
    author: String,
    genre: String,
    subgenre: Option<String>,
    description: String,
    word_count: i64,
    visibility: String,
    likes: i64,
    downloads: i64,
    published_at: i64,
    tags: String,
    content_hash: Option<String>,
    owner_id: Option<String>,
}

impl TryFrom<NovelRow> for GalleryNovel {
    type Error = RepositoryError;

    fn try_from(row: NovelRow) -> Result<Self, Self::Error> {
        Ok(GalleryNovel {
            visibility: Visibility::parse(&row.visibility).ok_or_else(|| {
                RepositoryError::SerializationError(format!("Invalid visibility: {}", row.visibility))
            })?,
            tags: serde_json::from_str(&row.tags).map_err(serde_err)?,
            id: row.id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            subgenre: row.subgenre,
            description: row.description,
            word_count: row.word_count.max(0) as u64,
            likes: row.likes,
            downloads: row.downloads,
            published_at: row.published_at,
            content_hash: row.content_hash,
            owner_id: row.owner_id,
        })
    }
}

#[derive(FromRow)]
struct RecordRow {
    #[sqlx(flatten)]
    meta: NovelRow,
    content: String,
}

impl TryFrom<RecordRow> for GalleryRecord {
    type Error = RepositoryError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let content: Project = serde_json::from_str(&row.content).map_err(serde_err)?;
        Ok(GalleryRecord {
            meta: GalleryNovel::try_from(row.meta)?,
            content,
        })
    }
}

#[async_trait]
impl GalleryRepositoryPort for SqliteGalleryRepository {
    async fn fetch_page(&self, query: &GalleryPageQuery) -> Result<Vec<GalleryNovel>, RepositoryError> {
        let filter = &query.filter;
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {META_COLUMNS} FROM novels WHERE "));

        match filter.scope {
            GalleryScope::Mine => {
                builder.push("owner_id = ").push_bind(query.owner_id.clone());
            }
            GalleryScope::Community => {
                builder
                    .push("visibility = ")
                    .push_bind(Visibility::Public.as_str());
            }
        }
        if let Some(genre) = filter.genre_filter() {
            builder.push(" AND genre = ").push_bind(genre.to_string());
        }
        if let Some(search) = filter.search_filter() {
            builder
                .push(" AND title LIKE ")
                .push_bind(like_pattern(search))
                .push(" ESCAPE '\\'");
        }
        builder.push(match filter.sort {
            GallerySort::Popular => " ORDER BY likes DESC, published_at DESC",
            GallerySort::Newest => " ORDER BY published_at DESC",
        });
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows: Vec<NovelRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(GalleryNovel::try_from).collect()
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Vec<HashMatch>, RepositoryError> {
        let rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, owner_id, visibility FROM novels WHERE content_hash = ? ORDER BY published_at",
        )
        .bind(content_hash)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, owner_id, visibility)| HashMatch {
                id,
                owner_id,
                visibility: Visibility::parse(&visibility).unwrap_or_default(),
            })
            .collect())
    }

    async fn insert(&self, record: &GalleryRecord) -> Result<(), RepositoryError> {
        let meta = &record.meta;
        let tags = serde_json::to_string(&meta.tags).map_err(serde_err)?;
        let content = serde_json::to_string(&record.content).map_err(serde_err)?;

        sqlx::query(
            r#"
            INSERT INTO novels (id, title, author, genre, subgenre, description, word_count, visibility,
                                likes, downloads, published_at, tags, content_hash, owner_id, content)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&meta.id)
        .bind(&meta.title)
        .bind(&meta.author)
        .bind(&meta.genre)
        .bind(&meta.subgenre)
        .bind(&meta.description)
        .bind(meta.word_count as i64)
        .bind(meta.visibility.as_str())
        .bind(meta.likes)
        .bind(meta.downloads)
        .bind(meta.published_at)
        .bind(tags)
        .bind(&meta.content_hash)
        .bind(&meta.owner_id)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(meta.id.clone())
            }
            other => db_err(other),
        })?;

        Ok(())
    }

    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE novels SET visibility = ? WHERE id = ?")
            .bind(visibility.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        let likes: Option<i64> =
            sqlx::query_scalar("UPDATE novels SET likes = likes + 1 WHERE id = ? RETURNING likes")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        likes
            .map(Some)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn set_likes(&self, id: &str, likes: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE novels SET likes = ? WHERE id = ?")
            .bind(likes)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn increment_downloads(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        let downloads: Option<i64> = sqlx::query_scalar(
            "UPDATE novels SET downloads = downloads + 1 WHERE id = ? RETURNING downloads",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        downloads
            .map(Some)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn set_downloads(&self, id: &str, downloads: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE novels SET downloads = ? WHERE id = ?")
            .bind(downloads)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn find_record(&self, id: &str) -> Result<Option<GalleryRecord>, RepositoryError> {
        let row: Option<RecordRow> =
            sqlx::query_as(&format!("SELECT {META_COLUMNS}, content FROM novels WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(GalleryRecord::try_from).transpose()
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gallery::GalleryFilter;
    use crate::domain::project::fixtures::sample_project;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn setup() -> SqliteGalleryRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteGalleryRepository::new(pool)
    }

    fn record(id: &str, title: &str, owner: &str, visibility: Visibility, published_at: i64) -> GalleryRecord {
        let mut project = sample_project();
        project.title = title.to_string();
        GalleryRecord::from_project(
            id.to_string(),
            &project,
            format!("hash-{id}"),
            visibility,
            owner.to_string(),
            published_at,
        )
    }

    fn query(filter: GalleryFilter, owner: &str) -> GalleryPageQuery {
        GalleryPageQuery {
            filter,
            page: 0,
            limit: 12,
            owner_id: owner.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_record() {
        let repo = setup().await;
        let rec = record("n1", "The Starless Crown", "me", Visibility::Public, 10);
        repo.insert(&rec).await.unwrap();

        let found = repo.find_record("n1").await.unwrap().unwrap();
        assert_eq!(found, rec);
        assert!(repo.find_record("missing").await.unwrap().is_none());

        let matches = repo.find_by_hash("hash-n1").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].owner_id.as_deref(), Some("me"));

        assert!(matches!(
            repo.insert(&rec).await,
            Err(RepositoryError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_scope_sort_and_search() {
        let repo = setup().await;
        repo.insert(&record("a", "Ash and Ember", "me", Visibility::Private, 1)).await.unwrap();
        repo.insert(&record("b", "Crown of Ash", "you", Visibility::Public, 2)).await.unwrap();
        repo.insert(&record("c", "100% Rain", "you", Visibility::Public, 3)).await.unwrap();
        repo.increment_likes("b").await.unwrap();

        // community 只看公开作品，popular 按点赞倒序
        let rows = repo.fetch_page(&query(GalleryFilter::default(), "me")).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let mine = GalleryFilter {
            scope: GalleryScope::Mine,
            ..Default::default()
        };
        let rows = repo.fetch_page(&query(mine, "me")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].visibility, Visibility::Private);

        let search = GalleryFilter {
            search: "ash".to_string(),
            sort: GallerySort::Newest,
            ..Default::default()
        };
        let rows = repo.fetch_page(&query(search, "me")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "b");

        // 通配符按字面匹配
        let literal = GalleryFilter {
            search: "0%".to_string(),
            ..Default::default()
        };
        let rows = repo.fetch_page(&query(literal, "me")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "c");
    }

    #[tokio::test]
    async fn test_genre_and_paging() {
        let repo = setup().await;
        for i in 0..5 {
            repo.insert(&record(&format!("n{i}"), "Tale", "o", Visibility::Public, i))
                .await
                .unwrap();
        }

        let mut page = query(
            GalleryFilter {
                sort: GallerySort::Newest,
                ..Default::default()
            },
            "o",
        );
        page.limit = 2;
        page.page = 2;
        let rows = repo.fetch_page(&page).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "n0");

        let scifi = GalleryFilter {
            genre: "Sci-Fi".to_string(),
            ..Default::default()
        };
        assert!(repo.fetch_page(&query(scifi, "o")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counters_and_visibility() {
        let repo = setup().await;
        repo.insert(&record("n1", "Tale", "o", Visibility::Public, 0)).await.unwrap();

        assert_eq!(repo.increment_likes("n1").await.unwrap(), Some(1));
        repo.set_likes("n1", 10).await.unwrap();
        assert_eq!(repo.increment_likes("n1").await.unwrap(), Some(11));
        assert_eq!(repo.increment_downloads("n1").await.unwrap(), Some(1));
        repo.set_downloads("n1", 5).await.unwrap();

        repo.update_visibility("n1", Visibility::Private).await.unwrap();
        let found = repo.find_record("n1").await.unwrap().unwrap();
        assert_eq!(found.meta.likes, 11);
        assert_eq!(found.meta.downloads, 5);
        assert_eq!(found.meta.visibility, Visibility::Private);

        assert!(matches!(
            repo.increment_likes("missing").await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(repo.health_check().await.is_ok());
    }
}
