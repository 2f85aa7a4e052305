//! Blog post repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::post::{Post, PostFilter, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post and return it with its id
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get a post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get a post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Check whether a slug is taken by a different post
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// List posts matching the filter, newest first
    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<PagedResult<Post>>;

    /// Persist a fully-updated post row
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post and its dependent rows
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Increment the view counter
    async fn increment_view(&self, id: i64) -> Result<()>;

    /// Count posts, optionally restricted to a status
    async fn count(&self, status: Option<PostStatus>) -> Result<i64>;

    /// Sum of view counters across all posts
    async fn total_views(&self) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(exclude_id.unwrap_or(0))
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(exclude_id.unwrap_or(0))
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count > 0)
    }

    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<PagedResult<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), filter, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), filter, params).await,
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn increment_view(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await?;
            }
        }
        Ok(())
    }

    async fn count(&self, status: Option<PostStatus>) -> Result<i64> {
        let count: i64 = match (self.pool.driver(), status) {
            (DatabaseDriver::Sqlite, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            (DatabaseDriver::Sqlite, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            (DatabaseDriver::Mysql, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
            (DatabaseDriver::Mysql, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }

    async fn total_views(&self) -> Result<i64> {
        let total: Option<i64> = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT SUM(view_count) FROM posts")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT SUM(view_count) FROM posts")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(total.unwrap_or(0))
    }
}

const POST_COLUMNS: &str = "id, slug, title, excerpt, content, content_html, tags, status, \
     published_at, view_count, like_count, favorite_count, comment_count, created_at, updated_at";

fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

macro_rules! row_to_post {
    ($row:expr) => {{
        let row = $row;
        Post {
            id: row.get("id"),
            slug: row.get("slug"),
            title: row.get("title"),
            excerpt: row.get("excerpt"),
            content: row.get("content"),
            content_html: row.get("content_html"),
            tags: parse_tags(&row.get::<String, _>("tags")),
            status: PostStatus::parse(&row.get::<String, _>("status")).unwrap_or(PostStatus::Draft),
            published_at: row.get("published_at"),
            view_count: row.get("view_count"),
            like_count: row.get("like_count"),
            favorite_count: row.get("favorite_count"),
            comment_count: row.get("comment_count"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }};
}

fn filter_clause(filter: &PostFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = filter.status {
        conditions.push("status = ?".to_string());
        binds.push(status.as_str().to_string());
    }
    if let Some(ref tag) = filter.tag {
        conditions.push("tags LIKE ?".to_string());
        binds.push(format!("%\"{}\"%", tag.replace(['%', '_'], "")));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, binds)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO posts (slug, title, excerpt, content, content_html, tags, status,
            published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(serde_json::to_string(&post.tags)?)
    .bind(post.status.as_str())
    .bind(post.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let mut created = post.clone();
    created.id = result.last_insert_rowid();
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")?;
    Ok(row.map(|r| row_to_post!(&r)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")?;
    Ok(row.map(|r| row_to_post!(&r)))
}

async fn list_sqlite(
    pool: &SqlitePool,
    filter: &PostFilter,
    params: &ListParams,
) -> Result<PagedResult<Post>> {
    let (clause, binds) = filter_clause(filter);

    let count_sql = format!("SELECT COUNT(*) FROM posts{}", clause);
    let mut count_query = sqlx::query_scalar(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query.fetch_one(pool).await?;

    let sql = format!(
        "SELECT {} FROM posts{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, clause
    );
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let items = rows.iter().map(|r| row_to_post!(r)).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn update_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE posts
        SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, tags = ?,
            status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(serde_json::to_string(&post.tags)?)
    .bind(post.status.as_str())
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    let mut updated = post.clone();
    updated.updated_at = now;
    Ok(updated)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    if result.rows_affected() > 0 {
        sqlx::query("DELETE FROM comments WHERE target_kind = 'post' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM likes WHERE target_kind = 'post' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM favorites WHERE target_kind = 'post' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        return Ok(true);
    }
    Ok(false)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO posts (slug, title, excerpt, content, content_html, tags, status,
            published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(serde_json::to_string(&post.tags)?)
    .bind(post.status.as_str())
    .bind(post.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let mut created = post.clone();
    created.id = result.last_insert_id() as i64;
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")?;
    Ok(row.map(|r| row_to_post!(&r)))
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")?;
    Ok(row.map(|r| row_to_post!(&r)))
}

async fn list_mysql(
    pool: &MySqlPool,
    filter: &PostFilter,
    params: &ListParams,
) -> Result<PagedResult<Post>> {
    let (clause, binds) = filter_clause(filter);

    let count_sql = format!("SELECT COUNT(*) FROM posts{}", clause);
    let mut count_query = sqlx::query_scalar(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query.fetch_one(pool).await?;

    let sql = format!(
        "SELECT {} FROM posts{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, clause
    );
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let items = rows.iter().map(|r| row_to_post!(r)).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn update_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE posts
        SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, tags = ?,
            status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(serde_json::to_string(&post.tags)?)
    .bind(post.status.as_str())
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    let mut updated = post.clone();
    updated.updated_at = now;
    Ok(updated)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    if result.rows_affected() > 0 {
        sqlx::query("DELETE FROM comments WHERE target_kind = 'post' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM likes WHERE target_kind = 'post' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM favorites WHERE target_kind = 'post' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> Arc<dyn PostRepository> {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPostRepository::boxed(pool)
    }

    fn sample(slug: &str, status: PostStatus) -> Post {
        let now = Utc::now();
        Post {
            id: 0,
            slug: slug.to_string(),
            title: format!("Post {}", slug),
            excerpt: "Excerpt".to_string(),
            content: "# Heading".to_string(),
            content_html: "<h1>Heading</h1>".to_string(),
            tags: vec!["rust".to_string()],
            status,
            published_at: (status == PostStatus::Published).then(Utc::now),
            view_count: 0,
            like_count: 0,
            favorite_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let repo = setup().await;
        let created = repo
            .create(&sample("first", PostStatus::Published))
            .await
            .expect("create failed");
        assert!(created.id > 0);

        let fetched = repo
            .get_by_slug("first")
            .await
            .unwrap()
            .expect("post missing");
        assert_eq!(fetched.title, "Post first");
        assert_eq!(fetched.tags, vec!["rust"]);
        assert!(fetched.published_at.is_some());
    }

    #[tokio::test]
    async fn test_list_filters_by_tag() {
        let repo = setup().await;
        repo.create(&sample("rusty", PostStatus::Published)).await.unwrap();
        let mut other = sample("webby", PostStatus::Published);
        other.tags = vec!["web".to_string()];
        repo.create(&other).await.unwrap();

        let filter = PostFilter {
            tag: Some("rust".to_string()),
            ..Default::default()
        };
        let result = repo.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].slug, "rusty");
    }

    #[tokio::test]
    async fn test_slug_exists_excludes_self() {
        let repo = setup().await;
        let created = repo.create(&sample("mine", PostStatus::Draft)).await.unwrap();
        assert!(repo.slug_exists("mine", None).await.unwrap());
        assert!(!repo.slug_exists("mine", Some(created.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_view() {
        let repo = setup().await;
        let created = repo.create(&sample("seen", PostStatus::Published)).await.unwrap();
        repo.increment_view(created.id).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.view_count, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create(&sample("gone", PostStatus::Draft)).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
