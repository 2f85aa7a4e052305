//! Session repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get a session by its token
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session by its token
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all expired sessions; returns the number removed
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), session).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), session).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete session")?;
            }
        }
        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                    .bind(now)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete expired sessions")?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                    .bind(now)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete expired sessions")?
                    .rows_affected()
            }
        };
        Ok(affected as i64)
    }
}

async fn create_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query("SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session")?;

    Ok(row.map(|r| Session {
        id: r.get("id"),
        user_id: r.get("user_id"),
        expires_at: r.get("expires_at"),
        created_at: r.get("created_at"),
    }))
}

async fn create_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query("SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session")?;

    Ok(row.map(|r| Session {
        id: r.get("id"),
        user_id: r.get("user_id"),
        expires_at: r.get("expires_at"),
        created_at: r.get("created_at"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::Duration;

    async fn setup() -> (Arc<dyn SessionRepository>, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = crate::db::repositories::SqlxUserRepository::boxed(pool.clone());
        let user = users
            .create(&User::new(
                "owner".into(),
                "owner@example.com".into(),
                "hash".into(),
                UserRole::Admin,
            ))
            .await
            .expect("user create failed");

        (SqlxSessionRepository::boxed(pool), user.id)
    }

    fn session_for(user_id: i64, days: i64) -> Session {
        let now = Utc::now();
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(days),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, user_id) = setup().await;
        let session = session_for(user_id, 7);

        repo.create(&session).await.expect("create failed");
        let fetched = repo
            .get_by_id(&session.id)
            .await
            .expect("get failed")
            .expect("session missing");
        assert_eq!(fetched.user_id, user_id);
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, user_id) = setup().await;
        let session = session_for(user_id, 7);
        repo.create(&session).await.unwrap();

        repo.delete(&session.id).await.unwrap();
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_only_removes_expired() {
        let (repo, user_id) = setup().await;
        let live = session_for(user_id, 7);
        let dead = session_for(user_id, -1);
        repo.create(&live).await.unwrap();
        repo.create(&dead).await.unwrap();

        let removed = repo.delete_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.get_by_id(&live.id).await.unwrap().is_some());
        assert!(repo.get_by_id(&dead.id).await.unwrap().is_none());
    }
}
