//! Attachment repository
//!
//! Serves both `project_files` and `post_files`; the owner enum picks the
//! table, the row shape is identical.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Attachment, AttachmentOwner, NewAttachment};

/// Attachment repository trait
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Register an uploaded file
    async fn create(&self, input: &NewAttachment) -> Result<Attachment>;

    /// Look up an attachment by owner kind and id
    async fn get_by_id(&self, owner: AttachmentOwner, id: i64) -> Result<Option<Attachment>>;

    /// All attachments of an owner, oldest first
    async fn list_by_owner(&self, owner: AttachmentOwner, owner_id: i64) -> Result<Vec<Attachment>>;

    /// Delete an attachment row; returns the deleted row for disk cleanup
    async fn delete(&self, owner: AttachmentOwner, id: i64) -> Result<Option<Attachment>>;

    /// Increment the download counter
    async fn increment_download(&self, owner: AttachmentOwner, id: i64) -> Result<()>;
}

/// SQLx-based attachment repository implementation
pub struct SqlxAttachmentRepository {
    pool: DynDatabasePool,
}

impl SqlxAttachmentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AttachmentRepository> {
        Arc::new(Self::new(pool))
    }
}

macro_rules! row_to_attachment {
    ($row:expr, $owner:expr) => {{
        let row = $row;
        let owner = $owner;
        Attachment {
            id: row.get("id"),
            owner,
            owner_id: row.get(owner.owner_column()),
            stored_path: row.get("stored_path"),
            original_name: row.get("original_name"),
            content_type: row.get("content_type"),
            size_bytes: row.get("size_bytes"),
            download_count: row.get("download_count"),
            created_at: row.get("created_at"),
        }
    }};
}

#[async_trait]
impl AttachmentRepository for SqlxAttachmentRepository {
    async fn create(&self, input: &NewAttachment) -> Result<Attachment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, owner: AttachmentOwner, id: i64) -> Result<Option<Attachment>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", owner.table());
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to fetch attachment")?;
                Ok(row.map(|r| row_to_attachment!(&r, owner)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to fetch attachment")?;
                Ok(row.map(|r| row_to_attachment!(&r, owner)))
            }
        }
    }

    async fn list_by_owner(&self, owner: AttachmentOwner, owner_id: i64) -> Result<Vec<Attachment>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY created_at ASC",
            owner.table(),
            owner.owner_column()
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(owner_id)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list attachments")?;
                Ok(rows.iter().map(|r| row_to_attachment!(r, owner)).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(owner_id)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list attachments")?;
                Ok(rows.iter().map(|r| row_to_attachment!(r, owner)).collect())
            }
        }
    }

    async fn delete(&self, owner: AttachmentOwner, id: i64) -> Result<Option<Attachment>> {
        let existing = self.get_by_id(owner, id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let sql = format!("DELETE FROM {} WHERE id = ?", owner.table());
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(&sql)
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete attachment")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(&sql)
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete attachment")?;
            }
        }
        Ok(existing)
    }

    async fn increment_download(&self, owner: AttachmentOwner, id: i64) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET download_count = download_count + 1 WHERE id = ?",
            owner.table()
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(&sql)
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(&sql)
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await?;
            }
        }
        Ok(())
    }
}

async fn create_sqlite(pool: &SqlitePool, input: &NewAttachment) -> Result<Attachment> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO {} ({}, stored_path, original_name, content_type, size_bytes, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        input.owner.table(),
        input.owner.owner_column()
    );
    let result = sqlx::query(&sql)
        .bind(input.owner_id)
        .bind(&input.stored_path)
        .bind(&input.original_name)
        .bind(&input.content_type)
        .bind(input.size_bytes)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create attachment")?;

    Ok(Attachment {
        id: result.last_insert_rowid(),
        owner: input.owner,
        owner_id: input.owner_id,
        stored_path: input.stored_path.clone(),
        original_name: input.original_name.clone(),
        content_type: input.content_type.clone(),
        size_bytes: input.size_bytes,
        download_count: 0,
        created_at: now,
    })
}

async fn create_mysql(pool: &MySqlPool, input: &NewAttachment) -> Result<Attachment> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO {} ({}, stored_path, original_name, content_type, size_bytes, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        input.owner.table(),
        input.owner.owner_column()
    );
    let result = sqlx::query(&sql)
        .bind(input.owner_id)
        .bind(&input.stored_path)
        .bind(&input.original_name)
        .bind(&input.content_type)
        .bind(input.size_bytes)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create attachment")?;

    Ok(Attachment {
        id: result.last_insert_id() as i64,
        owner: input.owner,
        owner_id: input.owner_id,
        stored_path: input.stored_path.clone(),
        original_name: input.original_name.clone(),
        content_type: input.content_type.clone(),
        size_bytes: input.size_bytes,
        download_count: 0,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{ProjectRepository, SqlxProjectRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Project, ProjectStatus};

    async fn setup() -> (Arc<dyn AttachmentRepository>, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let projects = SqlxProjectRepository::new(pool.clone());
        let now = Utc::now();
        let project = projects
            .create(&Project {
                id: 0,
                slug: "owner".to_string(),
                title: "Owner".to_string(),
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

        (SqlxAttachmentRepository::boxed(pool), project.id)
    }

    fn new_attachment(project_id: i64, name: &str) -> NewAttachment {
        NewAttachment {
            owner: AttachmentOwner::Project,
            owner_id: project_id,
            stored_path: format!("documents/{}.pdf", name),
            original_name: format!("{}.pdf", name),
            content_type: "application/pdf".to_string(),
            size_bytes: 1024,
        }
    }

    #[tokio::test]
    async fn test_create_list_and_download_counter() {
        let (repo, project_id) = setup().await;
        let created = repo.create(&new_attachment(project_id, "spec")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.download_count, 0);

        repo.increment_download(AttachmentOwner::Project, created.id)
            .await
            .unwrap();

        let listed = repo
            .list_by_owner(AttachmentOwner::Project, project_id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].download_count, 1);
    }

    #[tokio::test]
    async fn test_delete_returns_row_for_disk_cleanup() {
        let (repo, project_id) = setup().await;
        let created = repo.create(&new_attachment(project_id, "old")).await.unwrap();

        let deleted = repo
            .delete(AttachmentOwner::Project, created.id)
            .await
            .unwrap()
            .expect("row should be returned");
        assert_eq!(deleted.stored_path, "documents/old.pdf");

        assert!(repo
            .delete(AttachmentOwner::Project, created.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_owner_tables_are_separate() {
        let (repo, project_id) = setup().await;
        repo.create(&new_attachment(project_id, "a")).await.unwrap();

        let post_files = repo
            .list_by_owner(AttachmentOwner::Post, project_id)
            .await
            .unwrap();
        assert!(post_files.is_empty());
    }
}
