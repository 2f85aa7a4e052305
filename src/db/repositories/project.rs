//! Project repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::project::{Project, ProjectFilter, ProjectStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Project repository trait
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a new project and return it with its id
    async fn create(&self, project: &Project) -> Result<Project>;

    /// Get a project by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Project>>;

    /// Get a project by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>>;

    /// Check whether a slug is taken by a different project
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// List projects matching the filter, newest first (featured ordering
    /// uses sort_order)
    async fn list(&self, filter: &ProjectFilter, params: &ListParams) -> Result<PagedResult<Project>>;

    /// Persist a fully-updated project row
    async fn update(&self, project: &Project) -> Result<Project>;

    /// Delete a project and its dependent rows (comments, likes, favorites);
    /// attachment rows cascade via foreign key
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Increment the view counter
    async fn increment_view(&self, id: i64) -> Result<()>;

    /// Count projects, optionally restricted to a status
    async fn count(&self, status: Option<ProjectStatus>) -> Result<i64>;

    /// Sum of view counters across all projects
    async fn total_views(&self) -> Result<i64>;
}

/// SQLx-based project repository implementation
pub struct SqlxProjectRepository {
    pool: DynDatabasePool,
}

impl SqlxProjectRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProjectRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), project).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), project).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(exclude_id.unwrap_or(0))
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(exclude_id.unwrap_or(0))
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count > 0)
    }

    async fn list(&self, filter: &ProjectFilter, params: &ListParams) -> Result<PagedResult<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), filter, params).await
            }
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), filter, params).await,
        }
    }

    async fn update(&self, project: &Project) -> Result<Project> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), project).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), project).await,
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
                sqlx::query("UPDATE projects SET view_count = view_count + 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("UPDATE projects SET view_count = view_count + 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await?;
            }
        }
        Ok(())
    }

    async fn count(&self, status: Option<ProjectStatus>) -> Result<i64> {
        let count: i64 = match (self.pool.driver(), status) {
            (DatabaseDriver::Sqlite, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            (DatabaseDriver::Sqlite, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM projects")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            (DatabaseDriver::Mysql, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
            (DatabaseDriver::Mysql, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM projects")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }

    async fn total_views(&self) -> Result<i64> {
        let total: Option<i64> = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT SUM(view_count) FROM projects")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT SUM(view_count) FROM projects")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(total.unwrap_or(0))
    }
}

const PROJECT_COLUMNS: &str = "id, slug, title, summary, description, tech_stack, repo_url, \
     demo_url, cover_image, status, featured, sort_order, view_count, like_count, \
     favorite_count, comment_count, created_at, updated_at";

/// Parse a JSON array column, tolerating bad data
fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

macro_rules! row_to_project {
    ($row:expr) => {{
        let row = $row;
        Project {
            id: row.get("id"),
            slug: row.get("slug"),
            title: row.get("title"),
            summary: row.get("summary"),
            description: row.get("description"),
            tech_stack: parse_string_list(&row.get::<String, _>("tech_stack")),
            repo_url: row.get("repo_url"),
            demo_url: row.get("demo_url"),
            cover_image: row.get("cover_image"),
            status: ProjectStatus::parse(&row.get::<String, _>("status"))
                .unwrap_or(ProjectStatus::Draft),
            featured: row.get::<i64, _>("featured") != 0,
            sort_order: row.get::<i32, _>("sort_order"),
            view_count: row.get("view_count"),
            like_count: row.get("like_count"),
            favorite_count: row.get("favorite_count"),
            comment_count: row.get("comment_count"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }};
}

/// Build WHERE clause and ORDER for a filter; values are bound separately
fn filter_clause(filter: &ProjectFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = filter.status {
        conditions.push("status = ?".to_string());
        binds.push(status.as_str().to_string());
    }
    if let Some(featured) = filter.featured {
        conditions.push("featured = ?".to_string());
        binds.push(if featured { "1" } else { "0" }.to_string());
    }
    if let Some(ref tech) = filter.tech {
        // tech_stack is a JSON array of strings; substring match on the
        // quoted value is enough for both backends
        conditions.push("tech_stack LIKE ?".to_string());
        binds.push(format!("%\"{}\"%", tech.replace(['%', '_'], "")));
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

async fn create_sqlite(pool: &SqlitePool, project: &Project) -> Result<Project> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO projects (slug, title, summary, description, tech_stack, repo_url,
            demo_url, cover_image, status, featured, sort_order, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&project.slug)
    .bind(&project.title)
    .bind(&project.summary)
    .bind(&project.description)
    .bind(serde_json::to_string(&project.tech_stack)?)
    .bind(&project.repo_url)
    .bind(&project.demo_url)
    .bind(&project.cover_image)
    .bind(project.status.as_str())
    .bind(project.featured as i64)
    .bind(project.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    let mut created = project.clone();
    created.id = result.last_insert_rowid();
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch project")?;
    Ok(row.map(|r| row_to_project!(&r)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", PROJECT_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch project")?;
    Ok(row.map(|r| row_to_project!(&r)))
}

async fn list_sqlite(
    pool: &SqlitePool,
    filter: &ProjectFilter,
    params: &ListParams,
) -> Result<PagedResult<Project>> {
    let (clause, binds) = filter_clause(filter);

    let count_sql = format!("SELECT COUNT(*) FROM projects{}", clause);
    let mut count_query = sqlx::query_scalar(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query.fetch_one(pool).await?;

    let sql = format!(
        "SELECT {} FROM projects{} ORDER BY featured DESC, sort_order ASC, created_at DESC LIMIT ? OFFSET ?",
        PROJECT_COLUMNS, clause
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
        .context("Failed to list projects")?;

    let items = rows.iter().map(|r| row_to_project!(r)).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn update_sqlite(pool: &SqlitePool, project: &Project) -> Result<Project> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE projects
        SET slug = ?, title = ?, summary = ?, description = ?, tech_stack = ?,
            repo_url = ?, demo_url = ?, cover_image = ?, status = ?, featured = ?,
            sort_order = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&project.slug)
    .bind(&project.title)
    .bind(&project.summary)
    .bind(&project.description)
    .bind(serde_json::to_string(&project.tech_stack)?)
    .bind(&project.repo_url)
    .bind(&project.demo_url)
    .bind(&project.cover_image)
    .bind(project.status.as_str())
    .bind(project.featured as i64)
    .bind(project.sort_order)
    .bind(now)
    .bind(project.id)
    .execute(pool)
    .await
    .context("Failed to update project")?;

    let mut updated = project.clone();
    updated.updated_at = now;
    Ok(updated)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete project")?;

    if result.rows_affected() > 0 {
        // Polymorphic dependents have no FK; clean them up here
        sqlx::query("DELETE FROM comments WHERE target_kind = 'project' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM likes WHERE target_kind = 'project' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM favorites WHERE target_kind = 'project' AND target_id = ?")
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

async fn create_mysql(pool: &MySqlPool, project: &Project) -> Result<Project> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO projects (slug, title, summary, description, tech_stack, repo_url,
            demo_url, cover_image, status, featured, sort_order, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&project.slug)
    .bind(&project.title)
    .bind(&project.summary)
    .bind(&project.description)
    .bind(serde_json::to_string(&project.tech_stack)?)
    .bind(&project.repo_url)
    .bind(&project.demo_url)
    .bind(&project.cover_image)
    .bind(project.status.as_str())
    .bind(project.featured as i64)
    .bind(project.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    let mut created = project.clone();
    created.id = result.last_insert_id() as i64;
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch project")?;
    Ok(row.map(|r| row_to_project!(&r)))
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", PROJECT_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch project")?;
    Ok(row.map(|r| row_to_project!(&r)))
}

async fn list_mysql(
    pool: &MySqlPool,
    filter: &ProjectFilter,
    params: &ListParams,
) -> Result<PagedResult<Project>> {
    let (clause, binds) = filter_clause(filter);

    let count_sql = format!("SELECT COUNT(*) FROM projects{}", clause);
    let mut count_query = sqlx::query_scalar(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query.fetch_one(pool).await?;

    let sql = format!(
        "SELECT {} FROM projects{} ORDER BY featured DESC, sort_order ASC, created_at DESC LIMIT ? OFFSET ?",
        PROJECT_COLUMNS, clause
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
        .context("Failed to list projects")?;

    let items = rows.iter().map(|r| row_to_project!(r)).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn update_mysql(pool: &MySqlPool, project: &Project) -> Result<Project> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE projects
        SET slug = ?, title = ?, summary = ?, description = ?, tech_stack = ?,
            repo_url = ?, demo_url = ?, cover_image = ?, status = ?, featured = ?,
            sort_order = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&project.slug)
    .bind(&project.title)
    .bind(&project.summary)
    .bind(&project.description)
    .bind(serde_json::to_string(&project.tech_stack)?)
    .bind(&project.repo_url)
    .bind(&project.demo_url)
    .bind(&project.cover_image)
    .bind(project.status.as_str())
    .bind(project.featured as i64)
    .bind(project.sort_order)
    .bind(now)
    .bind(project.id)
    .execute(pool)
    .await
    .context("Failed to update project")?;

    let mut updated = project.clone();
    updated.updated_at = now;
    Ok(updated)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete project")?;

    if result.rows_affected() > 0 {
        sqlx::query("DELETE FROM comments WHERE target_kind = 'project' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM likes WHERE target_kind = 'project' AND target_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM favorites WHERE target_kind = 'project' AND target_id = ?")
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

    async fn setup() -> Arc<dyn ProjectRepository> {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxProjectRepository::boxed(pool)
    }

    fn sample(slug: &str, status: ProjectStatus) -> Project {
        let now = Utc::now();
        Project {
            id: 0,
            slug: slug.to_string(),
            title: format!("Project {}", slug),
            summary: "A sample project".to_string(),
            description: "Longer description".to_string(),
            tech_stack: vec!["rust".to_string(), "axum".to_string()],
            repo_url: Some("https://example.com/repo".to_string()),
            demo_url: None,
            cover_image: None,
            status,
            featured: false,
            sort_order: 0,
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
            .create(&sample("hello", ProjectStatus::Published))
            .await
            .expect("create failed");
        assert!(created.id > 0);

        let fetched = repo
            .get_by_slug("hello")
            .await
            .expect("get failed")
            .expect("project missing");
        assert_eq!(fetched.title, "Project hello");
        assert_eq!(fetched.tech_stack, vec!["rust", "axum"]);
        assert_eq!(fetched.status, ProjectStatus::Published);
    }

    #[tokio::test]
    async fn test_slug_exists() {
        let repo = setup().await;
        let created = repo
            .create(&sample("taken", ProjectStatus::Draft))
            .await
            .unwrap();

        assert!(repo.slug_exists("taken", None).await.unwrap());
        assert!(!repo.slug_exists("free", None).await.unwrap());
        // The project itself is excluded when updating
        assert!(!repo.slug_exists("taken", Some(created.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = setup().await;
        repo.create(&sample("pub", ProjectStatus::Published)).await.unwrap();
        repo.create(&sample("draft", ProjectStatus::Draft)).await.unwrap();

        let filter = ProjectFilter {
            status: Some(ProjectStatus::Published),
            ..Default::default()
        };
        let result = repo.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].slug, "pub");

        let all = repo.list(&ProjectFilter::default(), &ListParams::default()).await.unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_tech() {
        let repo = setup().await;
        repo.create(&sample("a", ProjectStatus::Published)).await.unwrap();
        let mut other = sample("b", ProjectStatus::Published);
        other.tech_stack = vec!["go".to_string()];
        repo.create(&other).await.unwrap();

        let filter = ProjectFilter {
            tech: Some("rust".to_string()),
            ..Default::default()
        };
        let result = repo.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].slug, "a");
    }

    #[tokio::test]
    async fn test_featured_sorts_first() {
        let repo = setup().await;
        repo.create(&sample("plain", ProjectStatus::Published)).await.unwrap();
        let mut featured = sample("star", ProjectStatus::Published);
        featured.featured = true;
        repo.create(&featured).await.unwrap();

        let result = repo
            .list(&ProjectFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(result.items[0].slug, "star");
    }

    #[tokio::test]
    async fn test_increment_view() {
        let repo = setup().await;
        let created = repo.create(&sample("v", ProjectStatus::Published)).await.unwrap();

        repo.increment_view(created.id).await.unwrap();
        repo.increment_view(created.id).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.view_count, 2);
    }

    #[tokio::test]
    async fn test_delete_returns_false_for_missing() {
        let repo = setup().await;
        assert!(!repo.delete(999).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let repo = setup().await;
        repo.create(&sample("p1", ProjectStatus::Published)).await.unwrap();
        repo.create(&sample("p2", ProjectStatus::Published)).await.unwrap();
        repo.create(&sample("d1", ProjectStatus::Draft)).await.unwrap();

        assert_eq!(repo.count(None).await.unwrap(), 3);
        assert_eq!(repo.count(Some(ProjectStatus::Published)).await.unwrap(), 2);
        assert_eq!(repo.count(Some(ProjectStatus::Draft)).await.unwrap(), 1);
    }
}
