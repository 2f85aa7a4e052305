//! User repository
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user's mutable fields
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(SELECT_USER_BY_ID)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to fetch user")?;
                Ok(row.map(|r| row_to_user(&r)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(SELECT_USER_BY_ID)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to fetch user")?;
                Ok(row.map(|r| mysql_row_to_user(&r)))
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_one_sqlite(self.pool.as_sqlite().unwrap(), "username", username).await
            }
            DatabaseDriver::Mysql => {
                fetch_one_mysql(self.pool.as_mysql().unwrap(), "username", username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_one_sqlite(self.pool.as_sqlite().unwrap(), "email", email).await
            }
            DatabaseDriver::Mysql => {
                fetch_one_mysql(self.pool.as_mysql().unwrap(), "email", email).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete user")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete user")?;
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }
}

const SELECT_USER_BY_ID: &str =
    "SELECT id, username, email, password_hash, role, created_at, updated_at FROM users WHERE id = ?";

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(row.get::<String, _>("role").as_str())
            .unwrap_or(UserRole::User),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn mysql_row_to_user(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(row.get::<String, _>("role").as_str())
            .unwrap_or(UserRole::User),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role,
        created_at: now,
        updated_at: now,
    })
}

async fn fetch_one_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<User>> {
    // column is always a fixed identifier from this module, never user input
    let sql = format!(
        "SELECT id, username, email, password_hash, role, created_at, updated_at FROM users WHERE {} = ?",
        column
    );
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user")?;

    Ok(row.map(|r| row_to_user(&r)))
}

async fn update_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, role = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    let mut updated = user.clone();
    updated.updated_at = now;
    Ok(updated)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role,
        created_at: now,
        updated_at: now,
    })
}

async fn fetch_one_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, username, email, password_hash, role, created_at, updated_at FROM users WHERE {} = ?",
        column
    );
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user")?;

    Ok(row.map(|r| mysql_row_to_user(&r)))
}

async fn update_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, role = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    let mut updated = user.clone();
    updated.updated_at = now;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> Arc<dyn UserRepository> {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::boxed(pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let user = User::new(
            "owner".into(),
            "owner@example.com".into(),
            "hash".into(),
            UserRole::Admin,
        );

        let created = repo.create(&user).await.expect("create failed");
        assert!(created.id > 0);

        let fetched = repo
            .get_by_id(created.id)
            .await
            .expect("get failed")
            .expect("user missing");
        assert_eq!(fetched.username, "owner");
        assert_eq!(fetched.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_get_by_username_and_email() {
        let repo = setup().await;
        let user = User::new(
            "visitor".into(),
            "visitor@example.com".into(),
            "hash".into(),
            UserRole::User,
        );
        repo.create(&user).await.expect("create failed");

        assert!(repo.get_by_username("visitor").await.unwrap().is_some());
        assert!(repo.get_by_email("visitor@example.com").await.unwrap().is_some());
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_by_db() {
        let repo = setup().await;
        let user = User::new("dup".into(), "a@example.com".into(), "h".into(), UserRole::User);
        repo.create(&user).await.expect("first create failed");

        let clash = User::new("dup".into(), "b@example.com".into(), "h".into(), UserRole::User);
        assert!(repo.create(&clash).await.is_err());
    }

    #[tokio::test]
    async fn test_count() {
        let repo = setup().await;
        assert_eq!(repo.count().await.unwrap(), 0);
        let user = User::new("one".into(), "one@example.com".into(), "h".into(), UserRole::Admin);
        repo.create(&user).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_changes_role() {
        let repo = setup().await;
        let user = User::new("u".into(), "u@example.com".into(), "h".into(), UserRole::User);
        let mut created = repo.create(&user).await.unwrap();

        created.role = UserRole::Admin;
        repo.update(&created).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let user = User::new("gone".into(), "gone@example.com".into(), "h".into(), UserRole::User);
        let created = repo.create(&user).await.unwrap();

        repo.delete(created.id).await.unwrap();
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
