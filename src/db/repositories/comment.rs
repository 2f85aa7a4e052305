//! Comment repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::{Comment, CommentStatus, CommentWithMeta, CreateCommentInput, TargetKind};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment with the given status
    async fn create(
        &self,
        input: CreateCommentInput,
        user_id: Option<i64>,
        ip: Option<String>,
        ua: Option<String>,
        status: CommentStatus,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Get approved comments for a target, threaded one level
    async fn get_by_target(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        fingerprint: Option<&str>,
    ) -> Result<Vec<CommentWithMeta>>;

    /// Page through comments with a given status, newest first
    async fn list_by_status(
        &self,
        status: CommentStatus,
        params: &ListParams,
    ) -> Result<PagedResult<CommentWithMeta>>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Update comment status
    async fn update_status(&self, id: i64, status: CommentStatus) -> Result<bool>;

    /// Count comments, optionally restricted to a status
    async fn count(&self, status: Option<CommentStatus>) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        input: CreateCommentInput,
        user_id: Option<i64>,
        ip: Option<String>,
        ua: Option<String>,
        status: CommentStatus,
    ) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(self.pool.as_sqlite().unwrap(), input, user_id, ip, ua, status).await
            }
            DatabaseDriver::Mysql => {
                create_mysql(self.pool.as_mysql().unwrap(), input, user_id, ip, ua, status).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_target(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        fingerprint: Option<&str>,
    ) -> Result<Vec<CommentWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_target_sqlite(self.pool.as_sqlite().unwrap(), target_kind, target_id, fingerprint)
                    .await
            }
            DatabaseDriver::Mysql => {
                get_by_target_mysql(self.pool.as_mysql().unwrap(), target_kind, target_id, fingerprint)
                    .await
            }
        }
    }

    async fn list_by_status(
        &self,
        status: CommentStatus,
        params: &ListParams,
    ) -> Result<PagedResult<CommentWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_status_sqlite(self.pool.as_sqlite().unwrap(), status, params).await
            }
            DatabaseDriver::Mysql => {
                list_by_status_mysql(self.pool.as_mysql().unwrap(), status, params).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn update_status(&self, id: i64, status: CommentStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                update_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }

    async fn count(&self, status: Option<CommentStatus>) -> Result<i64> {
        let count: i64 = match (self.pool.driver(), status) {
            (DatabaseDriver::Sqlite, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE status = ?")
                    .bind(status.to_string())
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            (DatabaseDriver::Sqlite, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM comments")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            (DatabaseDriver::Mysql, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE status = ?")
                    .bind(status.to_string())
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
            (DatabaseDriver::Mysql, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM comments")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }
}

/// Table carrying the denormalized comment_count for a target, if any
fn counter_table(kind: TargetKind) -> Option<&'static str> {
    match kind {
        TargetKind::Project => Some("projects"),
        TargetKind::Post => Some("posts"),
        TargetKind::Comment => None,
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(
    pool: &SqlitePool,
    input: CreateCommentInput,
    user_id: Option<i64>,
    ip: Option<String>,
    ua: Option<String>,
    status: CommentStatus,
) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"INSERT INTO comments (target_kind, target_id, user_id, parent_id, nickname, email,
           content, status, ip_address, user_agent, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(input.target_kind.to_string())
    .bind(input.target_id)
    .bind(user_id)
    .bind(input.parent_id)
    .bind(&input.nickname)
    .bind(&input.email)
    .bind(&input.content)
    .bind(status.to_string())
    .bind(&ip)
    .bind(&ua)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();

    // Only count approved comments on the target
    if status == CommentStatus::Approved {
        if let Some(table) = counter_table(input.target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET comment_count = comment_count + 1 WHERE id = ?",
                table
            ))
            .bind(input.target_id)
            .execute(pool)
            .await?;
        }
    }

    Ok(Comment {
        id,
        target_kind: input.target_kind,
        target_id: input.target_id,
        user_id,
        parent_id: input.parent_id,
        nickname: input.nickname,
        email: input.email,
        content: input.content,
        status,
        ip_address: ip,
        user_agent: ua,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| Comment {
        id: r.get("id"),
        target_kind: r
            .get::<String, _>("target_kind")
            .parse()
            .unwrap_or(TargetKind::Post),
        target_id: r.get("target_id"),
        user_id: r.get("user_id"),
        parent_id: r.get("parent_id"),
        nickname: r.get("nickname"),
        email: r.get("email"),
        content: r.get("content"),
        status: r.get::<String, _>("status").parse().unwrap_or_default(),
        ip_address: r.get("ip_address"),
        user_agent: r.get("user_agent"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }))
}

async fn get_by_target_sqlite(
    pool: &SqlitePool,
    target_kind: TargetKind,
    target_id: i64,
    fingerprint: Option<&str>,
) -> Result<Vec<CommentWithMeta>> {
    let rows = sqlx::query(
        r#"SELECT c.*, u.username,
           (SELECT COUNT(*) FROM likes WHERE target_kind = 'comment' AND target_id = c.id) as like_count
           FROM comments c
           LEFT JOIN users u ON c.user_id = u.id
           WHERE c.target_kind = ? AND c.target_id = ? AND c.status = 'approved'
           ORDER BY c.created_at ASC"#,
    )
    .bind(target_kind.to_string())
    .bind(target_id)
    .fetch_all(pool)
    .await?;

    let mut comments: Vec<CommentWithMeta> = Vec::new();
    let mut replies_map: std::collections::HashMap<i64, Vec<CommentWithMeta>> =
        std::collections::HashMap::new();

    for row in rows {
        let id: i64 = row.get("id");
        let parent_id: Option<i64> = row.get("parent_id");
        let email: Option<String> = row.get("email");
        let like_count: i64 = row.get("like_count");
        let nickname: Option<String> = row.get("nickname");
        let username: Option<String> = row.try_get("username").ok();

        // Registered commenters display their username
        let display_name = username.or(nickname);

        let is_liked = if let Some(fp) = fingerprint {
            is_comment_liked_sqlite(pool, id, fp).await.unwrap_or(false)
        } else {
            false
        };

        let comment = CommentWithMeta {
            id,
            target_kind,
            target_id,
            user_id: row.get("user_id"),
            parent_id,
            nickname: display_name,
            content: row.get("content"),
            status: row.get::<String, _>("status").parse().unwrap_or_default(),
            created_at: row.get("created_at"),
            avatar_url: CommentWithMeta::gravatar_url(&email),
            like_count,
            is_liked,
            replies: Vec::new(),
        };

        if let Some(pid) = parent_id {
            replies_map.entry(pid).or_default().push(comment);
        } else {
            comments.push(comment);
        }
    }

    // Attach replies to their parents
    for comment in &mut comments {
        if let Some(replies) = replies_map.remove(&comment.id) {
            comment.replies = replies;
        }
    }

    Ok(comments)
}

async fn is_comment_liked_sqlite(pool: &SqlitePool, comment_id: i64, fingerprint: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM likes WHERE target_kind = 'comment' AND target_id = ? AND fingerprint = ?",
    )
    .bind(comment_id)
    .bind(fingerprint)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

async fn list_by_status_sqlite(
    pool: &SqlitePool,
    status: CommentStatus,
    params: &ListParams,
) -> Result<PagedResult<CommentWithMeta>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE status = ?")
        .bind(status.to_string())
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        r#"SELECT c.*, u.username
           FROM comments c
           LEFT JOIN users u ON c.user_id = u.id
           WHERE c.status = ?
           ORDER BY c.created_at DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(status.to_string())
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let comments = rows
        .iter()
        .map(|row| {
            let email: Option<String> = row.get("email");
            let nickname: Option<String> = row.get("nickname");
            let username: Option<String> = row.try_get("username").ok();

            CommentWithMeta {
                id: row.get("id"),
                target_kind: row
                    .get::<String, _>("target_kind")
                    .parse()
                    .unwrap_or(TargetKind::Post),
                target_id: row.get("target_id"),
                user_id: row.get("user_id"),
                parent_id: row.get("parent_id"),
                nickname: username.or(nickname),
                content: row.get("content"),
                status: row.get::<String, _>("status").parse().unwrap_or_default(),
                created_at: row.get("created_at"),
                avatar_url: CommentWithMeta::gravatar_url(&email),
                like_count: 0,
                is_liked: false,
                replies: Vec::new(),
            }
        })
        .collect();

    Ok(PagedResult::new(comments, total, params))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // Capture the target first so the counter can be adjusted
    let row = sqlx::query("SELECT target_kind, target_id, status FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = row {
        let target_kind: TargetKind = row
            .get::<String, _>("target_kind")
            .parse()
            .unwrap_or(TargetKind::Post);
        let target_id: i64 = row.get("target_id");
        let status: CommentStatus = row.get::<String, _>("status").parse().unwrap_or_default();

        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            if status == CommentStatus::Approved {
                if let Some(table) = counter_table(target_kind) {
                    sqlx::query(&format!(
                        "UPDATE {} SET comment_count = MAX(0, comment_count - 1) WHERE id = ?",
                        table
                    ))
                    .bind(target_id)
                    .execute(pool)
                    .await?;
                }
            }
            return Ok(true);
        }
    }

    Ok(false)
}

async fn update_status_sqlite(pool: &SqlitePool, id: i64, status: CommentStatus) -> Result<bool> {
    let row = sqlx::query("SELECT target_kind, target_id, status FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = row {
        let target_kind: TargetKind = row
            .get::<String, _>("target_kind")
            .parse()
            .unwrap_or(TargetKind::Post);
        let target_id: i64 = row.get("target_id");
        let old_status: CommentStatus = row.get::<String, _>("status").parse().unwrap_or_default();

        let result = sqlx::query("UPDATE comments SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            if let Some(table) = counter_table(target_kind) {
                if old_status != CommentStatus::Approved && status == CommentStatus::Approved {
                    sqlx::query(&format!(
                        "UPDATE {} SET comment_count = comment_count + 1 WHERE id = ?",
                        table
                    ))
                    .bind(target_id)
                    .execute(pool)
                    .await?;
                } else if old_status == CommentStatus::Approved && status != CommentStatus::Approved
                {
                    sqlx::query(&format!(
                        "UPDATE {} SET comment_count = MAX(0, comment_count - 1) WHERE id = ?",
                        table
                    ))
                    .bind(target_id)
                    .execute(pool)
                    .await?;
                }
            }
            return Ok(true);
        }
    }

    Ok(false)
}

// ============================================================================
// MySQL implementations (same shape as SQLite; GREATEST instead of MAX)
// ============================================================================

async fn create_mysql(
    pool: &MySqlPool,
    input: CreateCommentInput,
    user_id: Option<i64>,
    ip: Option<String>,
    ua: Option<String>,
    status: CommentStatus,
) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"INSERT INTO comments (target_kind, target_id, user_id, parent_id, nickname, email,
           content, status, ip_address, user_agent, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(input.target_kind.to_string())
    .bind(input.target_id)
    .bind(user_id)
    .bind(input.parent_id)
    .bind(&input.nickname)
    .bind(&input.email)
    .bind(&input.content)
    .bind(status.to_string())
    .bind(&ip)
    .bind(&ua)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_id() as i64;

    if status == CommentStatus::Approved {
        if let Some(table) = counter_table(input.target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET comment_count = comment_count + 1 WHERE id = ?",
                table
            ))
            .bind(input.target_id)
            .execute(pool)
            .await?;
        }
    }

    Ok(Comment {
        id,
        target_kind: input.target_kind,
        target_id: input.target_id,
        user_id,
        parent_id: input.parent_id,
        nickname: input.nickname,
        email: input.email,
        content: input.content,
        status,
        ip_address: ip,
        user_agent: ua,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| Comment {
        id: r.get("id"),
        target_kind: r
            .get::<String, _>("target_kind")
            .parse()
            .unwrap_or(TargetKind::Post),
        target_id: r.get("target_id"),
        user_id: r.get("user_id"),
        parent_id: r.get("parent_id"),
        nickname: r.get("nickname"),
        email: r.get("email"),
        content: r.get("content"),
        status: r.get::<String, _>("status").parse().unwrap_or_default(),
        ip_address: r.get("ip_address"),
        user_agent: r.get("user_agent"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }))
}

async fn get_by_target_mysql(
    pool: &MySqlPool,
    target_kind: TargetKind,
    target_id: i64,
    fingerprint: Option<&str>,
) -> Result<Vec<CommentWithMeta>> {
    let rows = sqlx::query(
        r#"SELECT c.*, u.username,
           (SELECT COUNT(*) FROM likes WHERE target_kind = 'comment' AND target_id = c.id) as like_count
           FROM comments c
           LEFT JOIN users u ON c.user_id = u.id
           WHERE c.target_kind = ? AND c.target_id = ? AND c.status = 'approved'
           ORDER BY c.created_at ASC"#,
    )
    .bind(target_kind.to_string())
    .bind(target_id)
    .fetch_all(pool)
    .await?;

    let mut comments: Vec<CommentWithMeta> = Vec::new();
    let mut replies_map: std::collections::HashMap<i64, Vec<CommentWithMeta>> =
        std::collections::HashMap::new();

    for row in rows {
        let id: i64 = row.get("id");
        let parent_id: Option<i64> = row.get("parent_id");
        let email: Option<String> = row.get("email");
        let like_count: i64 = row.get("like_count");
        let nickname: Option<String> = row.get("nickname");
        let username: Option<String> = row.try_get("username").ok();

        let display_name = username.or(nickname);

        let is_liked = if let Some(fp) = fingerprint {
            is_comment_liked_mysql(pool, id, fp).await.unwrap_or(false)
        } else {
            false
        };

        let comment = CommentWithMeta {
            id,
            target_kind,
            target_id,
            user_id: row.get("user_id"),
            parent_id,
            nickname: display_name,
            content: row.get("content"),
            status: row.get::<String, _>("status").parse().unwrap_or_default(),
            created_at: row.get("created_at"),
            avatar_url: CommentWithMeta::gravatar_url(&email),
            like_count,
            is_liked,
            replies: Vec::new(),
        };

        if let Some(pid) = parent_id {
            replies_map.entry(pid).or_default().push(comment);
        } else {
            comments.push(comment);
        }
    }

    for comment in &mut comments {
        if let Some(replies) = replies_map.remove(&comment.id) {
            comment.replies = replies;
        }
    }

    Ok(comments)
}

async fn is_comment_liked_mysql(pool: &MySqlPool, comment_id: i64, fingerprint: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM likes WHERE target_kind = 'comment' AND target_id = ? AND fingerprint = ?",
    )
    .bind(comment_id)
    .bind(fingerprint)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

async fn list_by_status_mysql(
    pool: &MySqlPool,
    status: CommentStatus,
    params: &ListParams,
) -> Result<PagedResult<CommentWithMeta>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE status = ?")
        .bind(status.to_string())
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        r#"SELECT c.*, u.username
           FROM comments c
           LEFT JOIN users u ON c.user_id = u.id
           WHERE c.status = ?
           ORDER BY c.created_at DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(status.to_string())
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let comments = rows
        .iter()
        .map(|row| {
            let email: Option<String> = row.get("email");
            let nickname: Option<String> = row.get("nickname");
            let username: Option<String> = row.try_get("username").ok();

            CommentWithMeta {
                id: row.get("id"),
                target_kind: row
                    .get::<String, _>("target_kind")
                    .parse()
                    .unwrap_or(TargetKind::Post),
                target_id: row.get("target_id"),
                user_id: row.get("user_id"),
                parent_id: row.get("parent_id"),
                nickname: username.or(nickname),
                content: row.get("content"),
                status: row.get::<String, _>("status").parse().unwrap_or_default(),
                created_at: row.get("created_at"),
                avatar_url: CommentWithMeta::gravatar_url(&email),
                like_count: 0,
                is_liked: false,
                replies: Vec::new(),
            }
        })
        .collect();

    Ok(PagedResult::new(comments, total, params))
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT target_kind, target_id, status FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = row {
        let target_kind: TargetKind = row
            .get::<String, _>("target_kind")
            .parse()
            .unwrap_or(TargetKind::Post);
        let target_id: i64 = row.get("target_id");
        let status: CommentStatus = row.get::<String, _>("status").parse().unwrap_or_default();

        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            if status == CommentStatus::Approved {
                if let Some(table) = counter_table(target_kind) {
                    sqlx::query(&format!(
                        "UPDATE {} SET comment_count = GREATEST(0, comment_count - 1) WHERE id = ?",
                        table
                    ))
                    .bind(target_id)
                    .execute(pool)
                    .await?;
                }
            }
            return Ok(true);
        }
    }

    Ok(false)
}

async fn update_status_mysql(pool: &MySqlPool, id: i64, status: CommentStatus) -> Result<bool> {
    let row = sqlx::query("SELECT target_kind, target_id, status FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = row {
        let target_kind: TargetKind = row
            .get::<String, _>("target_kind")
            .parse()
            .unwrap_or(TargetKind::Post);
        let target_id: i64 = row.get("target_id");
        let old_status: CommentStatus = row.get::<String, _>("status").parse().unwrap_or_default();

        let result = sqlx::query("UPDATE comments SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            if let Some(table) = counter_table(target_kind) {
                if old_status != CommentStatus::Approved && status == CommentStatus::Approved {
                    sqlx::query(&format!(
                        "UPDATE {} SET comment_count = comment_count + 1 WHERE id = ?",
                        table
                    ))
                    .bind(target_id)
                    .execute(pool)
                    .await?;
                } else if old_status == CommentStatus::Approved && status != CommentStatus::Approved
                {
                    sqlx::query(&format!(
                        "UPDATE {} SET comment_count = GREATEST(0, comment_count - 1) WHERE id = ?",
                        table
                    ))
                    .bind(target_id)
                    .execute(pool)
                    .await?;
                }
            }
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{ProjectRepository, SqlxProjectRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{Project, ProjectStatus};

    async fn setup() -> (DynDatabasePool, Arc<dyn CommentRepository>, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let projects = SqlxProjectRepository::new(pool.clone());
        let now = Utc::now();
        let project = projects
            .create(&Project {
                id: 0,
                slug: "target".to_string(),
                title: "Target".to_string(),
                summary: String::new(),
                description: String::new(),
                tech_stack: vec![],
                repo_url: None,
                demo_url: None,
                cover_image: None,
                status: ProjectStatus::Published,
                featured: false,
                sort_order: 0,
                view_count: 0,
                like_count: 0,
                favorite_count: 0,
                comment_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("project create failed");

        (pool.clone(), SqlxCommentRepository::boxed(pool), project.id)
    }

    fn input(project_id: i64, content: &str) -> CreateCommentInput {
        CreateCommentInput {
            target_kind: TargetKind::Project,
            target_id: project_id,
            parent_id: None,
            nickname: Some("guest".to_string()),
            email: Some("guest@example.com".to_string()),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_approved_increments_target_count() {
        let (pool, repo, project_id) = setup().await;
        repo.create(input(project_id, "hi"), None, None, None, CommentStatus::Approved)
            .await
            .expect("create failed");

        let projects = SqlxProjectRepository::new(pool);
        let project = projects.get_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.comment_count, 1);
    }

    #[tokio::test]
    async fn test_create_pending_does_not_count() {
        let (pool, repo, project_id) = setup().await;
        repo.create(input(project_id, "hi"), None, None, None, CommentStatus::Pending)
            .await
            .unwrap();

        let projects = SqlxProjectRepository::new(pool);
        let project = projects.get_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.comment_count, 0);
    }

    #[tokio::test]
    async fn test_approving_pending_comment_counts_it() {
        let (pool, repo, project_id) = setup().await;
        let comment = repo
            .create(input(project_id, "hi"), None, None, None, CommentStatus::Pending)
            .await
            .unwrap();

        assert!(repo.update_status(comment.id, CommentStatus::Approved).await.unwrap());

        let projects = SqlxProjectRepository::new(pool);
        let project = projects.get_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.comment_count, 1);
    }

    #[tokio::test]
    async fn test_get_by_target_threads_replies() {
        let (_pool, repo, project_id) = setup().await;
        let parent = repo
            .create(input(project_id, "parent"), None, None, None, CommentStatus::Approved)
            .await
            .unwrap();
        let mut reply_input = input(project_id, "reply");
        reply_input.parent_id = Some(parent.id);
        repo.create(reply_input, None, None, None, CommentStatus::Approved)
            .await
            .unwrap();

        let threaded = repo
            .get_by_target(TargetKind::Project, project_id, None)
            .await
            .unwrap();
        assert_eq!(threaded.len(), 1);
        assert_eq!(threaded[0].replies.len(), 1);
        assert_eq!(threaded[0].replies[0].content, "reply");
    }

    #[tokio::test]
    async fn test_pending_comments_hidden_from_target_listing() {
        let (_pool, repo, project_id) = setup().await;
        repo.create(input(project_id, "visible"), None, None, None, CommentStatus::Approved)
            .await
            .unwrap();
        repo.create(input(project_id, "hidden"), None, None, None, CommentStatus::Pending)
            .await
            .unwrap();

        let listed = repo
            .get_by_target(TargetKind::Project, project_id, None)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "visible");
    }

    #[tokio::test]
    async fn test_delete_decrements_count() {
        let (pool, repo, project_id) = setup().await;
        let comment = repo
            .create(input(project_id, "bye"), None, None, None, CommentStatus::Approved)
            .await
            .unwrap();

        assert!(repo.delete(comment.id).await.unwrap());
        assert!(!repo.delete(comment.id).await.unwrap());

        let projects = SqlxProjectRepository::new(pool);
        let project = projects.get_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.comment_count, 0);
    }

    #[tokio::test]
    async fn test_list_by_status_pagination() {
        let (_pool, repo, project_id) = setup().await;
        for i in 0..3 {
            repo.create(
                input(project_id, &format!("c{}", i)),
                None,
                None,
                None,
                CommentStatus::Pending,
            )
            .await
            .unwrap();
        }

        let page = repo
            .list_by_status(CommentStatus::Pending, &ListParams::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let (_pool, repo, project_id) = setup().await;
        repo.create(input(project_id, "a"), None, None, None, CommentStatus::Approved)
            .await
            .unwrap();
        repo.create(input(project_id, "b"), None, None, None, CommentStatus::Pending)
            .await
            .unwrap();

        assert_eq!(repo.count(None).await.unwrap(), 2);
        assert_eq!(repo.count(Some(CommentStatus::Pending)).await.unwrap(), 1);
    }
}
