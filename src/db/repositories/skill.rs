//! Skill repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Skill;

/// Skill repository trait
#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn create(&self, skill: &Skill) -> Result<Skill>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Skill>>;
    /// All skills ordered by category, then sort order, then name
    async fn list(&self) -> Result<Vec<Skill>>;
    async fn update(&self, skill: &Skill) -> Result<Skill>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based skill repository implementation
pub struct SqlxSkillRepository {
    pool: DynDatabasePool,
}

impl SqlxSkillRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SkillRepository> {
        Arc::new(Self::new(pool))
    }
}

const SKILL_COLUMNS: &str = "id, name, category, level, sort_order, created_at, updated_at";
const SKILL_ORDER: &str = "ORDER BY category ASC, sort_order ASC, name ASC";

macro_rules! row_to_skill {
    ($row:expr) => {{
        let row = $row;
        Skill {
            id: row.get("id"),
            name: row.get("name"),
            category: row.get("category"),
            level: row.get("level"),
            sort_order: row.get("sort_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }};
}

#[async_trait]
impl SkillRepository for SqlxSkillRepository {
    async fn create(&self, skill: &Skill) -> Result<Skill> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), skill).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), skill).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Skill>> {
        let sql = format!("SELECT {} FROM skills WHERE id = ?", SKILL_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to fetch skill")?;
                Ok(row.map(|r| row_to_skill!(&r)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to fetch skill")?;
                Ok(row.map(|r| row_to_skill!(&r)))
            }
        }
    }

    async fn list(&self) -> Result<Vec<Skill>> {
        let sql = format!("SELECT {} FROM skills {}", SKILL_COLUMNS, SKILL_ORDER);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list skills")?;
                Ok(rows.iter().map(|r| row_to_skill!(r)).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list skills")?;
                Ok(rows.iter().map(|r| row_to_skill!(r)).collect())
            }
        }
    }

    async fn update(&self, skill: &Skill) -> Result<Skill> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), skill).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), skill).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM skills WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete skill")?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM skills WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete skill")?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM skills")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM skills")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await?
            }
        };
        Ok(count)
    }
}

async fn create_sqlite(pool: &SqlitePool, skill: &Skill) -> Result<Skill> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO skills (name, category, level, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&skill.name)
    .bind(&skill.category)
    .bind(skill.level)
    .bind(skill.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create skill")?;

    let mut created = skill.clone();
    created.id = result.last_insert_rowid();
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn update_sqlite(pool: &SqlitePool, skill: &Skill) -> Result<Skill> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE skills SET name = ?, category = ?, level = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&skill.name)
    .bind(&skill.category)
    .bind(skill.level)
    .bind(skill.sort_order)
    .bind(now)
    .bind(skill.id)
    .execute(pool)
    .await
    .context("Failed to update skill")?;

    let mut updated = skill.clone();
    updated.updated_at = now;
    Ok(updated)
}

async fn create_mysql(pool: &MySqlPool, skill: &Skill) -> Result<Skill> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO skills (name, category, level, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&skill.name)
    .bind(&skill.category)
    .bind(skill.level)
    .bind(skill.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create skill")?;

    let mut created = skill.clone();
    created.id = result.last_insert_id() as i64;
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn update_mysql(pool: &MySqlPool, skill: &Skill) -> Result<Skill> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE skills SET name = ?, category = ?, level = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&skill.name)
    .bind(&skill.category)
    .bind(skill.level)
    .bind(skill.sort_order)
    .bind(now)
    .bind(skill.id)
    .execute(pool)
    .await
    .context("Failed to update skill")?;

    let mut updated = skill.clone();
    updated.updated_at = now;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> Arc<dyn SkillRepository> {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSkillRepository::boxed(pool)
    }

    fn sample(name: &str, category: &str, sort_order: i32) -> Skill {
        let now = Utc::now();
        Skill {
            id: 0,
            name: name.to_string(),
            category: category.to_string(),
            level: 80,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_list_ordering() {
        let repo = setup().await;
        repo.create(&sample("Tokio", "Backend", 2)).await.unwrap();
        repo.create(&sample("Rust", "Backend", 1)).await.unwrap();
        repo.create(&sample("Ansible", "Tooling", 1)).await.unwrap();

        let skills = repo.list().await.unwrap();
        let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Tokio", "Ansible"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup().await;
        let mut skill = repo.create(&sample("Rust", "Backend", 0)).await.unwrap();

        skill.level = 95;
        repo.update(&skill).await.unwrap();
        assert_eq!(repo.get_by_id(skill.id).await.unwrap().unwrap().level, 95);

        assert!(repo.delete(skill.id).await.unwrap());
        assert!(!repo.delete(skill.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
