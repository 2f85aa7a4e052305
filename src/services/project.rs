//! Project service
//!
//! Business logic for portfolio projects: slug generation and uniqueness,
//! publish state, and the best-effort view counter.

use crate::db::repositories::ProjectRepository;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::project::{
    CreateProjectInput, Project, ProjectFilter, ProjectStatus, UpdateProjectInput,
};
use crate::services::slug::generate_slug;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for project service operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Slug already exists: {0}")]
    SlugExists(String),

    #[error("Project not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Project service
pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self {
        Self { repo }
    }

    /// Create a project.
    ///
    /// The slug is taken from the input or generated from the title, and
    /// must be unique.
    pub async fn create(&self, input: CreateProjectInput) -> Result<Project, ProjectServiceError> {
        if input.title.trim().is_empty() {
            return Err(ProjectServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }

        let slug = match input.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => generate_slug(s),
            None => generate_slug(&input.title),
        };
        if slug.is_empty() {
            return Err(ProjectServiceError::ValidationError(
                "Cannot derive a slug from the title".to_string(),
            ));
        }

        if self
            .repo
            .slug_exists(&slug, None)
            .await
            .context("Failed to check slug")?
        {
            return Err(ProjectServiceError::SlugExists(slug));
        }

        let now = Utc::now();
        let project = Project {
            id: 0,
            slug,
            title: input.title,
            summary: input.summary,
            description: input.description,
            tech_stack: input.tech_stack,
            repo_url: input.repo_url,
            demo_url: input.demo_url,
            cover_image: input.cover_image,
            status: input.status.unwrap_or_default(),
            featured: input.featured,
            sort_order: input.sort_order,
            view_count: 0,
            like_count: 0,
            favorite_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };

        Ok(self
            .repo
            .create(&project)
            .await
            .context("Failed to create project")?)
    }

    /// Get a published project by slug for the public site
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Project, ProjectServiceError> {
        let project = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to fetch project")?
            .ok_or(ProjectServiceError::NotFound)?;

        if project.status != ProjectStatus::Published {
            return Err(ProjectServiceError::NotFound);
        }
        Ok(project)
    }

    /// Get any project by id (admin)
    pub async fn get_by_id(&self, id: i64) -> Result<Project, ProjectServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to fetch project")?
            .ok_or(ProjectServiceError::NotFound)
    }

    /// List published projects for the public site
    pub async fn list_published(
        &self,
        featured: Option<bool>,
        tech: Option<String>,
        params: &ListParams,
    ) -> Result<PagedResult<Project>, ProjectServiceError> {
        let filter = ProjectFilter {
            featured,
            tech,
            status: Some(ProjectStatus::Published),
        };
        Ok(self
            .repo
            .list(&filter, params)
            .await
            .context("Failed to list projects")?)
    }

    /// List all projects regardless of status (admin)
    pub async fn list_all(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Project>, ProjectServiceError> {
        Ok(self
            .repo
            .list(&ProjectFilter::default(), params)
            .await
            .context("Failed to list projects")?)
    }

    /// Apply a partial update to a project
    pub async fn update(
        &self,
        id: i64,
        input: UpdateProjectInput,
    ) -> Result<Project, ProjectServiceError> {
        if !input.has_changes() {
            return Err(ProjectServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        let mut project = self.get_by_id(id).await?;

        if let Some(slug) = input.slug {
            let slug = generate_slug(&slug);
            if slug.is_empty() {
                return Err(ProjectServiceError::ValidationError(
                    "Slug cannot be empty".to_string(),
                ));
            }
            if self
                .repo
                .slug_exists(&slug, Some(id))
                .await
                .context("Failed to check slug")?
            {
                return Err(ProjectServiceError::SlugExists(slug));
            }
            project.slug = slug;
        }
        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ProjectServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            project.title = title;
        }
        if let Some(summary) = input.summary {
            project.summary = summary;
        }
        if let Some(description) = input.description {
            project.description = description;
        }
        if let Some(tech_stack) = input.tech_stack {
            project.tech_stack = tech_stack;
        }
        if let Some(repo_url) = input.repo_url {
            project.repo_url = repo_url;
        }
        if let Some(demo_url) = input.demo_url {
            project.demo_url = demo_url;
        }
        if let Some(cover_image) = input.cover_image {
            project.cover_image = cover_image;
        }
        if let Some(status) = input.status {
            project.status = status;
        }
        if let Some(featured) = input.featured {
            project.featured = featured;
        }
        if let Some(sort_order) = input.sort_order {
            project.sort_order = sort_order;
        }

        Ok(self
            .repo
            .update(&project)
            .await
            .context("Failed to update project")?)
    }

    /// Delete a project
    pub async fn delete(&self, id: i64) -> Result<(), ProjectServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete project")?;
        if !deleted {
            return Err(ProjectServiceError::NotFound);
        }
        Ok(())
    }

    /// Record a view. Lost updates are acceptable; failures are logged at
    /// debug level and swallowed.
    pub async fn record_view(&self, id: i64) {
        if let Err(e) = self.repo.increment_view(id).await {
            tracing::debug!("Failed to record project view for {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxProjectRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> ProjectService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ProjectService::new(SqlxProjectRepository::boxed(pool))
    }

    fn create_input(title: &str) -> CreateProjectInput {
        CreateProjectInput {
            slug: None,
            title: title.to_string(),
            summary: "Summary".to_string(),
            description: "Description".to_string(),
            tech_stack: vec!["rust".to_string()],
            repo_url: None,
            demo_url: None,
            cover_image: None,
            status: Some(ProjectStatus::Published),
            featured: false,
            sort_order: 0,
        }
    }

    #[tokio::test]
    async fn test_create_generates_slug_from_title() {
        let service = setup().await;
        let project = service
            .create(create_input("My Great Project"))
            .await
            .expect("create failed");
        assert_eq!(project.slug, "my-great-project");
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_fails() {
        let service = setup().await;
        service.create(create_input("Same Name")).await.unwrap();

        let result = service.create(create_input("Same Name")).await;
        assert!(matches!(result, Err(ProjectServiceError::SlugExists(_))));
    }

    #[tokio::test]
    async fn test_create_empty_title_fails() {
        let service = setup().await;
        let result = service.create(create_input("   ")).await;
        assert!(matches!(result, Err(ProjectServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_draft_hidden_from_public_lookup() {
        let service = setup().await;
        let mut input = create_input("Secret");
        input.status = Some(ProjectStatus::Draft);
        service.create(input).await.unwrap();

        let result = service.get_published_by_slug("secret").await;
        assert!(matches!(result, Err(ProjectServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_slug_conflict_fails() {
        let service = setup().await;
        service.create(create_input("First")).await.unwrap();
        let second = service.create(create_input("Second")).await.unwrap();

        let result = service
            .update(
                second.id,
                UpdateProjectInput {
                    slug: Some("First".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ProjectServiceError::SlugExists(_))));
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let service = setup().await;
        let project = service.create(create_input("Original")).await.unwrap();

        let updated = service
            .update(
                project.id,
                UpdateProjectInput {
                    title: Some("Renamed".to_string()),
                    featured: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert!(updated.featured);
        // Untouched fields survive
        assert_eq!(updated.summary, "Summary");
    }

    #[tokio::test]
    async fn test_update_no_changes_fails() {
        let service = setup().await;
        let project = service.create(create_input("Some")).await.unwrap();
        let result = service.update(project.id, UpdateProjectInput::default()).await;
        assert!(matches!(result, Err(ProjectServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = setup().await;
        let result = service.delete(12345).await;
        assert!(matches!(result, Err(ProjectServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_record_view_swallows_errors() {
        let service = setup().await;
        // Unknown id: the UPDATE matches nothing and must not panic
        service.record_view(999).await;
    }
}
