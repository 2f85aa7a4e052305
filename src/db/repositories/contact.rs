//! Contact message and guestbook repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::{ContactMessage, CreateContactInput, CreateGuestbookInput, GuestbookMessage};

/// Contact and guestbook repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Store a contact form submission
    async fn create_contact(&self, input: &CreateContactInput) -> Result<ContactMessage>;

    /// Page through contact messages, newest first; unread_only narrows
    async fn list_contact(&self, unread_only: bool, params: &ListParams)
        -> Result<PagedResult<ContactMessage>>;

    /// Mark a contact message read
    async fn mark_read(&self, id: i64) -> Result<bool>;

    /// Delete a contact message
    async fn delete_contact(&self, id: i64) -> Result<bool>;

    /// Number of unread contact messages
    async fn count_unread(&self) -> Result<i64>;

    /// Store a guestbook message
    async fn create_guestbook(&self, input: &CreateGuestbookInput) -> Result<GuestbookMessage>;

    /// Page through guestbook messages, newest first
    async fn list_guestbook(&self, params: &ListParams) -> Result<PagedResult<GuestbookMessage>>;

    /// Delete a guestbook message
    async fn delete_guestbook(&self, id: i64) -> Result<bool>;

    /// Total number of guestbook messages
    async fn count_guestbook(&self) -> Result<i64>;
}

/// SQLx-based contact repository implementation
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create_contact(&self, input: &CreateContactInput) -> Result<ContactMessage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_contact_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_contact_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn list_contact(
        &self,
        unread_only: bool,
        params: &ListParams,
    ) -> Result<PagedResult<ContactMessage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_contact_sqlite(self.pool.as_sqlite().unwrap(), unread_only, params).await
            }
            DatabaseDriver::Mysql => {
                list_contact_mysql(self.pool.as_mysql().unwrap(), unread_only, params).await
            }
        }
    }

    async fn mark_read(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("UPDATE contact_messages SET is_read = 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("UPDATE contact_messages SET is_read = 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn delete_contact(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM contact_messages WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM contact_messages WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn count_unread(&self) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE is_read = 0")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE is_read = 0")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }

    async fn create_guestbook(&self, input: &CreateGuestbookInput) -> Result<GuestbookMessage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_guestbook_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_guestbook_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn list_guestbook(&self, params: &ListParams) -> Result<PagedResult<GuestbookMessage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_guestbook_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_guestbook_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }

    async fn delete_guestbook(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM guestbook WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM guestbook WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn count_guestbook(&self) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM guestbook")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM guestbook")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }
}

macro_rules! row_to_contact {
    ($row:expr) => {{
        let row = $row;
        ContactMessage {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            subject: row.get("subject"),
            body: row.get("body"),
            is_read: row.get::<i64, _>("is_read") != 0,
            created_at: row.get("created_at"),
        }
    }};
}

async fn create_contact_sqlite(pool: &SqlitePool, input: &CreateContactInput) -> Result<ContactMessage> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO contact_messages (name, email, subject, body, is_read, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.subject)
    .bind(&input.body)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create contact message")?;

    Ok(ContactMessage {
        id: result.last_insert_rowid(),
        name: input.name.clone(),
        email: input.email.clone(),
        subject: input.subject.clone(),
        body: input.body.clone(),
        is_read: false,
        created_at: now,
    })
}

async fn list_contact_sqlite(
    pool: &SqlitePool,
    unread_only: bool,
    params: &ListParams,
) -> Result<PagedResult<ContactMessage>> {
    let clause = if unread_only { " WHERE is_read = 0" } else { "" };

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM contact_messages{}", clause))
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(&format!(
        "SELECT * FROM contact_messages{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        clause
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let items = rows.iter().map(|r| row_to_contact!(r)).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn create_guestbook_sqlite(pool: &SqlitePool, input: &CreateGuestbookInput) -> Result<GuestbookMessage> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO guestbook (nickname, body, created_at) VALUES (?, ?, ?)")
        .bind(&input.nickname)
        .bind(&input.body)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create guestbook message")?;

    Ok(GuestbookMessage {
        id: result.last_insert_rowid(),
        nickname: input.nickname.clone(),
        body: input.body.clone(),
        created_at: now,
    })
}

async fn list_guestbook_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<GuestbookMessage>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guestbook")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query("SELECT * FROM guestbook ORDER BY created_at DESC LIMIT ? OFFSET ?")
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

    let items = rows
        .iter()
        .map(|r| GuestbookMessage {
            id: r.get("id"),
            nickname: r.get("nickname"),
            body: r.get("body"),
            created_at: r.get("created_at"),
        })
        .collect();
    Ok(PagedResult::new(items, total, params))
}

async fn create_contact_mysql(pool: &MySqlPool, input: &CreateContactInput) -> Result<ContactMessage> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO contact_messages (name, email, subject, body, is_read, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.subject)
    .bind(&input.body)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create contact message")?;

    Ok(ContactMessage {
        id: result.last_insert_id() as i64,
        name: input.name.clone(),
        email: input.email.clone(),
        subject: input.subject.clone(),
        body: input.body.clone(),
        is_read: false,
        created_at: now,
    })
}

async fn list_contact_mysql(
    pool: &MySqlPool,
    unread_only: bool,
    params: &ListParams,
) -> Result<PagedResult<ContactMessage>> {
    let clause = if unread_only { " WHERE is_read = 0" } else { "" };

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM contact_messages{}", clause))
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(&format!(
        "SELECT * FROM contact_messages{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        clause
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let items = rows.iter().map(|r| row_to_contact!(r)).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn create_guestbook_mysql(pool: &MySqlPool, input: &CreateGuestbookInput) -> Result<GuestbookMessage> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO guestbook (nickname, body, created_at) VALUES (?, ?, ?)")
        .bind(&input.nickname)
        .bind(&input.body)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create guestbook message")?;

    Ok(GuestbookMessage {
        id: result.last_insert_id() as i64,
        nickname: input.nickname.clone(),
        body: input.body.clone(),
        created_at: now,
    })
}

async fn list_guestbook_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<GuestbookMessage>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guestbook")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query("SELECT * FROM guestbook ORDER BY created_at DESC LIMIT ? OFFSET ?")
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

    let items = rows
        .iter()
        .map(|r| GuestbookMessage {
            id: r.get("id"),
            nickname: r.get("nickname"),
            body: r.get("body"),
            created_at: r.get("created_at"),
        })
        .collect();
    Ok(PagedResult::new(items, total, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> Arc<dyn ContactRepository> {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxContactRepository::boxed(pool)
    }

    #[tokio::test]
    async fn test_contact_inbox_flow() {
        let repo = setup().await;
        let msg = repo
            .create_contact(&CreateContactInput {
                name: "Alex".to_string(),
                email: "alex@example.com".to_string(),
                subject: "Hi".to_string(),
                body: "Interested in a project".to_string(),
            })
            .await
            .unwrap();
        assert!(!msg.is_read);
        assert_eq!(repo.count_unread().await.unwrap(), 1);

        assert!(repo.mark_read(msg.id).await.unwrap());
        assert_eq!(repo.count_unread().await.unwrap(), 0);

        let unread = repo.list_contact(true, &ListParams::default()).await.unwrap();
        assert_eq!(unread.total, 0);
        let all = repo.list_contact(false, &ListParams::default()).await.unwrap();
        assert_eq!(all.total, 1);

        assert!(repo.delete_contact(msg.id).await.unwrap());
        assert!(!repo.delete_contact(msg.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_guestbook_flow() {
        let repo = setup().await;
        let msg = repo
            .create_guestbook(&CreateGuestbookInput {
                nickname: "visitor".to_string(),
                body: "Nice site!".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(repo.count_guestbook().await.unwrap(), 1);
        let page = repo.list_guestbook(&ListParams::default()).await.unwrap();
        assert_eq!(page.items[0].nickname, "visitor");

        assert!(repo.delete_guestbook(msg.id).await.unwrap());
        assert_eq!(repo.count_guestbook().await.unwrap(), 0);
    }
}
