//! Skill service

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use crate::db::repositories::SkillRepository;
use crate::models::{CreateSkillInput, Skill, UpdateSkillInput};

/// Error types for skill service operations
#[derive(Debug, thiserror::Error)]
pub enum SkillServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Skill not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Skill service
pub struct SkillService {
    repo: Arc<dyn SkillRepository>,
}

impl SkillService {
    pub fn new(repo: Arc<dyn SkillRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateSkillInput) -> Result<Skill, SkillServiceError> {
        if input.name.trim().is_empty() {
            return Err(SkillServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        if !(0..=100).contains(&input.level) {
            return Err(SkillServiceError::ValidationError(
                "Level must be between 0 and 100".to_string(),
            ));
        }

        let now = Utc::now();
        let skill = Skill {
            id: 0,
            name: input.name,
            category: input.category,
            level: input.level,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };

        Ok(self
            .repo
            .create(&skill)
            .await
            .context("Failed to create skill")?)
    }

    pub async fn list(&self) -> Result<Vec<Skill>, SkillServiceError> {
        Ok(self.repo.list().await.context("Failed to list skills")?)
    }

    pub async fn update(&self, id: i64, input: UpdateSkillInput) -> Result<Skill, SkillServiceError> {
        if !input.has_changes() {
            return Err(SkillServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        let mut skill = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to fetch skill")?
            .ok_or(SkillServiceError::NotFound)?;

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(SkillServiceError::ValidationError(
                    "Name cannot be empty".to_string(),
                ));
            }
            skill.name = name;
        }
        if let Some(category) = input.category {
            skill.category = category;
        }
        if let Some(level) = input.level {
            if !(0..=100).contains(&level) {
                return Err(SkillServiceError::ValidationError(
                    "Level must be between 0 and 100".to_string(),
                ));
            }
            skill.level = level;
        }
        if let Some(sort_order) = input.sort_order {
            skill.sort_order = sort_order;
        }

        Ok(self
            .repo
            .update(&skill)
            .await
            .context("Failed to update skill")?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SkillServiceError> {
        let deleted = self.repo.delete(id).await.context("Failed to delete skill")?;
        if !deleted {
            return Err(SkillServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSkillRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SkillService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SkillService::new(SqlxSkillRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let service = setup().await;
        service
            .create(CreateSkillInput {
                name: "Rust".to_string(),
                category: "Backend".to_string(),
                level: 90,
                sort_order: 0,
            })
            .await
            .unwrap();

        let skills = service.list().await.unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Rust");
    }

    #[tokio::test]
    async fn test_level_out_of_range_rejected() {
        let service = setup().await;
        let result = service
            .create(CreateSkillInput {
                name: "Rust".to_string(),
                category: "Backend".to_string(),
                level: 150,
                sort_order: 0,
            })
            .await;
        assert!(matches!(result, Err(SkillServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_missing_skill_is_not_found() {
        let service = setup().await;
        let result = service
            .update(
                42,
                UpdateSkillInput {
                    level: Some(50),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(SkillServiceError::NotFound)));
    }
}
