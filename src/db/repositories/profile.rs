//! Profile repository
//!
//! The profile table holds a single row with id 1; `upsert` creates or
//! replaces it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Profile, UpdateProfileInput};

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile row if it has been set up
    async fn get(&self) -> Result<Option<Profile>>;

    /// Create or replace the profile row
    async fn upsert(&self, input: &UpdateProfileInput) -> Result<Profile>;
}

/// SQLx-based profile repository implementation
pub struct SqlxProfileRepository {
    pool: DynDatabasePool,
}

impl SqlxProfileRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn get(&self) -> Result<Option<Profile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn upsert(&self, input: &UpdateProfileInput) -> Result<Profile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => upsert_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => upsert_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }
}

fn parse_social_links(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
}

async fn get_sqlite(pool: &SqlitePool) -> Result<Option<Profile>> {
    let row = sqlx::query("SELECT * FROM profile WHERE id = 1")
        .fetch_optional(pool)
        .await
        .context("Failed to fetch profile")?;

    Ok(row.map(|r| Profile {
        id: r.get("id"),
        display_name: r.get("display_name"),
        headline: r.get("headline"),
        bio: r.get("bio"),
        avatar: r.get("avatar"),
        location: r.get("location"),
        email: r.get("email"),
        social_links: parse_social_links(&r.get::<String, _>("social_links")),
        updated_at: r.get("updated_at"),
    }))
}

async fn upsert_sqlite(pool: &SqlitePool, input: &UpdateProfileInput) -> Result<Profile> {
    let now = Utc::now();
    let links = serde_json::to_string(&input.social_links)?;
    sqlx::query(
        r#"
        INSERT INTO profile (id, display_name, headline, bio, avatar, location, email, social_links, updated_at)
        VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            display_name = excluded.display_name,
            headline = excluded.headline,
            bio = excluded.bio,
            avatar = excluded.avatar,
            location = excluded.location,
            email = excluded.email,
            social_links = excluded.social_links,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&input.display_name)
    .bind(&input.headline)
    .bind(&input.bio)
    .bind(&input.avatar)
    .bind(&input.location)
    .bind(&input.email)
    .bind(&links)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert profile")?;

    Ok(Profile {
        id: 1,
        display_name: input.display_name.clone(),
        headline: input.headline.clone(),
        bio: input.bio.clone(),
        avatar: input.avatar.clone(),
        location: input.location.clone(),
        email: input.email.clone(),
        social_links: input.social_links.clone(),
        updated_at: now,
    })
}

async fn get_mysql(pool: &MySqlPool) -> Result<Option<Profile>> {
    let row = sqlx::query("SELECT * FROM profile WHERE id = 1")
        .fetch_optional(pool)
        .await
        .context("Failed to fetch profile")?;

    Ok(row.map(|r| Profile {
        id: r.get("id"),
        display_name: r.get("display_name"),
        headline: r.get("headline"),
        bio: r.get("bio"),
        avatar: r.get("avatar"),
        location: r.get("location"),
        email: r.get("email"),
        social_links: parse_social_links(&r.get::<String, _>("social_links")),
        updated_at: r.get("updated_at"),
    }))
}

async fn upsert_mysql(pool: &MySqlPool, input: &UpdateProfileInput) -> Result<Profile> {
    let now = Utc::now();
    let links = serde_json::to_string(&input.social_links)?;
    sqlx::query(
        r#"
        INSERT INTO profile (id, display_name, headline, bio, avatar, location, email, social_links, updated_at)
        VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            display_name = VALUES(display_name),
            headline = VALUES(headline),
            bio = VALUES(bio),
            avatar = VALUES(avatar),
            location = VALUES(location),
            email = VALUES(email),
            social_links = VALUES(social_links),
            updated_at = VALUES(updated_at)
        "#,
    )
    .bind(&input.display_name)
    .bind(&input.headline)
    .bind(&input.bio)
    .bind(&input.avatar)
    .bind(&input.location)
    .bind(&input.email)
    .bind(&links)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert profile")?;

    Ok(Profile {
        id: 1,
        display_name: input.display_name.clone(),
        headline: input.headline.clone(),
        bio: input.bio.clone(),
        avatar: input.avatar.clone(),
        location: input.location.clone(),
        email: input.email.clone(),
        social_links: input.social_links.clone(),
        updated_at: now,
    })
}
