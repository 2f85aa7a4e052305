//! Like and favorite repository
//!
//! Join-table rows with unique indexes give the at-most-one-per-identity
//! invariant; inserts use INSERT OR IGNORE (SQLite) / INSERT IGNORE (MySQL)
//! and report whether a row was actually written.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Favorite, TargetKind};

/// Like and favorite repository trait
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Add a like; returns false when the identity already liked the target
    async fn add_like(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<String>,
    ) -> Result<bool>;

    /// Remove a like; returns false when there was nothing to remove
    async fn remove_like(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<String>,
    ) -> Result<bool>;

    /// Check whether the identity has liked the target
    async fn is_liked(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<&str>,
    ) -> Result<bool>;

    /// Current like count for a target
    async fn like_count(&self, target_kind: TargetKind, target_id: i64) -> Result<i64>;

    /// Add a favorite for a user
    async fn add_favorite(&self, target_kind: TargetKind, target_id: i64, user_id: i64) -> Result<bool>;

    /// Remove a favorite for a user
    async fn remove_favorite(&self, target_kind: TargetKind, target_id: i64, user_id: i64) -> Result<bool>;

    /// Check whether the user has favorited the target
    async fn is_favorited(&self, target_kind: TargetKind, target_id: i64, user_id: i64) -> Result<bool>;

    /// All favorites of a user, newest first
    async fn list_favorites(&self, user_id: i64) -> Result<Vec<Favorite>>;

    /// Total number of likes across all targets
    async fn total_likes(&self) -> Result<i64>;
}

/// SQLx-based interaction repository implementation
pub struct SqlxInteractionRepository {
    pool: DynDatabasePool,
}

impl SqlxInteractionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InteractionRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Table carrying the denormalized counters for a target, if any
fn counter_table(kind: TargetKind) -> Option<&'static str> {
    match kind {
        TargetKind::Project => Some("projects"),
        TargetKind::Post => Some("posts"),
        TargetKind::Comment => None,
    }
}

#[async_trait]
impl InteractionRepository for SqlxInteractionRepository {
    async fn add_like(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<String>,
    ) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_like_sqlite(self.pool.as_sqlite().unwrap(), target_kind, target_id, user_id, fingerprint)
                    .await
            }
            DatabaseDriver::Mysql => {
                add_like_mysql(self.pool.as_mysql().unwrap(), target_kind, target_id, user_id, fingerprint)
                    .await
            }
        }
    }

    async fn remove_like(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<String>,
    ) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                remove_like_sqlite(self.pool.as_sqlite().unwrap(), target_kind, target_id, user_id, fingerprint)
                    .await
            }
            DatabaseDriver::Mysql => {
                remove_like_mysql(self.pool.as_mysql().unwrap(), target_kind, target_id, user_id, fingerprint)
                    .await
            }
        }
    }

    async fn is_liked(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<&str>,
    ) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                is_liked_sqlite(self.pool.as_sqlite().unwrap(), target_kind, target_id, user_id, fingerprint)
                    .await
            }
            DatabaseDriver::Mysql => {
                is_liked_mysql(self.pool.as_mysql().unwrap(), target_kind, target_id, user_id, fingerprint)
                    .await
            }
        }
    }

    async fn like_count(&self, target_kind: TargetKind, target_id: i64) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ?")
                    .bind(target_kind.to_string())
                    .bind(target_id)
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ?")
                    .bind(target_kind.to_string())
                    .bind(target_id)
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }

    async fn add_favorite(&self, target_kind: TargetKind, target_id: i64, user_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_favorite_sqlite(self.pool.as_sqlite().unwrap(), target_kind, target_id, user_id).await
            }
            DatabaseDriver::Mysql => {
                add_favorite_mysql(self.pool.as_mysql().unwrap(), target_kind, target_id, user_id).await
            }
        }
    }

    async fn remove_favorite(&self, target_kind: TargetKind, target_id: i64, user_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                remove_favorite_sqlite(self.pool.as_sqlite().unwrap(), target_kind, target_id, user_id).await
            }
            DatabaseDriver::Mysql => {
                remove_favorite_mysql(self.pool.as_mysql().unwrap(), target_kind, target_id, user_id).await
            }
        }
    }

    async fn is_favorited(&self, target_kind: TargetKind, target_id: i64, user_id: i64) -> Result<bool> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM favorites WHERE target_kind = ? AND target_id = ? AND user_id = ?",
                )
                .bind(target_kind.to_string())
                .bind(target_id)
                .bind(user_id)
                .fetch_one(self.pool.as_sqlite().unwrap())
                .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM favorites WHERE target_kind = ? AND target_id = ? AND user_id = ?",
                )
                .bind(target_kind.to_string())
                .bind(target_id)
                .bind(user_id)
                .fetch_one(self.pool.as_mysql().unwrap())
                .await?
            }
        };
        Ok(count > 0)
    }

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<Favorite>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(
                    "SELECT id, target_kind, target_id, user_id, created_at FROM favorites WHERE user_id = ? ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(self.pool.as_sqlite().unwrap())
                .await?;
                Ok(rows
                    .iter()
                    .map(|r| Favorite {
                        id: r.get("id"),
                        target_kind: r
                            .get::<String, _>("target_kind")
                            .parse()
                            .unwrap_or(TargetKind::Post),
                        target_id: r.get("target_id"),
                        user_id: r.get("user_id"),
                        created_at: r.get("created_at"),
                    })
                    .collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(
                    "SELECT id, target_kind, target_id, user_id, created_at FROM favorites WHERE user_id = ? ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(self.pool.as_mysql().unwrap())
                .await?;
                Ok(rows
                    .iter()
                    .map(|r| Favorite {
                        id: r.get("id"),
                        target_kind: r
                            .get::<String, _>("target_kind")
                            .parse()
                            .unwrap_or(TargetKind::Post),
                        target_id: r.get("target_id"),
                        user_id: r.get("user_id"),
                        created_at: r.get("created_at"),
                    })
                    .collect())
            }
        }
    }

    async fn total_likes(&self) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM likes")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM likes")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn add_like_sqlite(
    pool: &SqlitePool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: Option<i64>,
    fingerprint: Option<String>,
) -> Result<bool> {
    let now = Utc::now();
    let result = if let Some(uid) = user_id {
        sqlx::query(
            "INSERT OR IGNORE INTO likes (target_kind, target_id, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(target_kind.to_string())
        .bind(target_id)
        .bind(uid)
        .bind(now)
        .execute(pool)
        .await?
    } else if let Some(fp) = fingerprint {
        sqlx::query(
            "INSERT OR IGNORE INTO likes (target_kind, target_id, fingerprint, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(target_kind.to_string())
        .bind(target_id)
        .bind(fp)
        .bind(now)
        .execute(pool)
        .await?
    } else {
        return Ok(false);
    };

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET like_count = like_count + 1 WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn remove_like_sqlite(
    pool: &SqlitePool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: Option<i64>,
    fingerprint: Option<String>,
) -> Result<bool> {
    let result = if let Some(uid) = user_id {
        sqlx::query("DELETE FROM likes WHERE target_kind = ? AND target_id = ? AND user_id = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(uid)
            .execute(pool)
            .await?
    } else if let Some(fp) = fingerprint {
        sqlx::query("DELETE FROM likes WHERE target_kind = ? AND target_id = ? AND fingerprint = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(fp)
            .execute(pool)
            .await?
    } else {
        return Ok(false);
    };

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET like_count = MAX(0, like_count - 1) WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn is_liked_sqlite(
    pool: &SqlitePool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: Option<i64>,
    fingerprint: Option<&str>,
) -> Result<bool> {
    let count: i64 = if let Some(uid) = user_id {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ? AND user_id = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(uid)
            .fetch_one(pool)
            .await?
    } else if let Some(fp) = fingerprint {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ? AND fingerprint = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(fp)
            .fetch_one(pool)
            .await?
    } else {
        return Ok(false);
    };
    Ok(count > 0)
}

async fn add_favorite_sqlite(
    pool: &SqlitePool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO favorites (target_kind, target_id, user_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(target_kind.to_string())
    .bind(target_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET favorite_count = favorite_count + 1 WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn remove_favorite_sqlite(
    pool: &SqlitePool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: i64,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE target_kind = ? AND target_id = ? AND user_id = ?")
        .bind(target_kind.to_string())
        .bind(target_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET favorite_count = MAX(0, favorite_count - 1) WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn add_like_mysql(
    pool: &MySqlPool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: Option<i64>,
    fingerprint: Option<String>,
) -> Result<bool> {
    let now = Utc::now();
    let result = if let Some(uid) = user_id {
        sqlx::query(
            "INSERT IGNORE INTO likes (target_kind, target_id, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(target_kind.to_string())
        .bind(target_id)
        .bind(uid)
        .bind(now)
        .execute(pool)
        .await?
    } else if let Some(fp) = fingerprint {
        sqlx::query(
            "INSERT IGNORE INTO likes (target_kind, target_id, fingerprint, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(target_kind.to_string())
        .bind(target_id)
        .bind(fp)
        .bind(now)
        .execute(pool)
        .await?
    } else {
        return Ok(false);
    };

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET like_count = like_count + 1 WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn remove_like_mysql(
    pool: &MySqlPool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: Option<i64>,
    fingerprint: Option<String>,
) -> Result<bool> {
    let result = if let Some(uid) = user_id {
        sqlx::query("DELETE FROM likes WHERE target_kind = ? AND target_id = ? AND user_id = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(uid)
            .execute(pool)
            .await?
    } else if let Some(fp) = fingerprint {
        sqlx::query("DELETE FROM likes WHERE target_kind = ? AND target_id = ? AND fingerprint = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(fp)
            .execute(pool)
            .await?
    } else {
        return Ok(false);
    };

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET like_count = GREATEST(0, like_count - 1) WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn is_liked_mysql(
    pool: &MySqlPool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: Option<i64>,
    fingerprint: Option<&str>,
) -> Result<bool> {
    let count: i64 = if let Some(uid) = user_id {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ? AND user_id = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(uid)
            .fetch_one(pool)
            .await?
    } else if let Some(fp) = fingerprint {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ? AND fingerprint = ?")
            .bind(target_kind.to_string())
            .bind(target_id)
            .bind(fp)
            .fetch_one(pool)
            .await?
    } else {
        return Ok(false);
    };
    Ok(count > 0)
}

async fn add_favorite_mysql(
    pool: &MySqlPool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT IGNORE INTO favorites (target_kind, target_id, user_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(target_kind.to_string())
    .bind(target_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET favorite_count = favorite_count + 1 WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn remove_favorite_mysql(
    pool: &MySqlPool,
    target_kind: TargetKind,
    target_id: i64,
    user_id: i64,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE target_kind = ? AND target_id = ? AND user_id = ?")
        .bind(target_kind.to_string())
        .bind(target_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        if let Some(table) = counter_table(target_kind) {
            sqlx::query(&format!(
                "UPDATE {} SET favorite_count = GREATEST(0, favorite_count - 1) WHERE id = ?",
                table
            ))
            .bind(target_id)
            .execute(pool)
            .await?;
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{ProjectRepository, SqlxProjectRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{Project, ProjectStatus, User, UserRole};

    async fn setup() -> (DynDatabasePool, Arc<dyn InteractionRepository>, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "fan".into(),
                "fan@example.com".into(),
                "hash".into(),
                UserRole::User,
            ))
            .await
            .unwrap();

        let projects = SqlxProjectRepository::new(pool.clone());
        let now = Utc::now();
        let project = projects
            .create(&Project {
                id: 0,
                slug: "liked".to_string(),
                title: "Liked".to_string(),
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
            .unwrap();

        (pool.clone(), SqlxInteractionRepository::boxed(pool), project.id, user.id)
    }

    async fn project_counts(pool: &DynDatabasePool, id: i64) -> (i64, i64) {
        let projects = SqlxProjectRepository::new(pool.clone());
        let p = projects.get_by_id(id).await.unwrap().unwrap();
        (p.like_count, p.favorite_count)
    }

    #[tokio::test]
    async fn test_like_is_idempotent_per_user() {
        let (pool, repo, project_id, user_id) = setup().await;

        assert!(repo
            .add_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap());
        // Second like by the same user is a no-op
        assert!(!repo
            .add_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap());

        assert_eq!(project_counts(&pool, project_id).await.0, 1);
    }

    #[tokio::test]
    async fn test_like_unlike_leaves_count_at_baseline() {
        let (pool, repo, project_id, user_id) = setup().await;

        repo.add_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap();
        repo.remove_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap();

        assert_eq!(project_counts(&pool, project_id).await.0, 0);
        assert_eq!(repo.like_count(TargetKind::Project, project_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_like_by_fingerprint() {
        let (_pool, repo, project_id, _user_id) = setup().await;
        let fp = Some("fp-abc".to_string());

        assert!(repo
            .add_like(TargetKind::Project, project_id, None, fp.clone())
            .await
            .unwrap());
        assert!(!repo
            .add_like(TargetKind::Project, project_id, None, fp.clone())
            .await
            .unwrap());
        assert!(repo
            .is_liked(TargetKind::Project, project_id, None, Some("fp-abc"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_like_without_identity_is_rejected() {
        let (_pool, repo, project_id, _user_id) = setup().await;
        assert!(!repo
            .add_like(TargetKind::Project, project_id, None, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_favorite_roundtrip() {
        let (pool, repo, project_id, user_id) = setup().await;

        assert!(repo.add_favorite(TargetKind::Project, project_id, user_id).await.unwrap());
        assert!(!repo.add_favorite(TargetKind::Project, project_id, user_id).await.unwrap());
        assert!(repo.is_favorited(TargetKind::Project, project_id, user_id).await.unwrap());
        assert_eq!(project_counts(&pool, project_id).await.1, 1);

        let favorites = repo.list_favorites(user_id).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].target_id, project_id);

        assert!(repo.remove_favorite(TargetKind::Project, project_id, user_id).await.unwrap());
        assert_eq!(project_counts(&pool, project_id).await.1, 0);
    }

    #[tokio::test]
    async fn test_total_likes() {
        let (_pool, repo, project_id, user_id) = setup().await;
        repo.add_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap();
        repo.add_like(TargetKind::Project, project_id, None, Some("fp".to_string()))
            .await
            .unwrap();
        assert_eq!(repo.total_likes().await.unwrap(), 2);
    }
}
