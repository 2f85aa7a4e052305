//! Blog post service
//!
//! Same shape as the project service, plus markdown rendering at save
//! time and published_at stamping on first publish.

use crate::db::repositories::PostRepository;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::post::{CreatePostInput, Post, PostFilter, PostStatus, UpdatePostInput};
use crate::services::markdown::render_markdown;
use crate::services::slug::generate_slug;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Slug already exists: {0}")]
    SlugExists(String),

    #[error("Post not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Create a post; renders markdown and stamps published_at when the
    /// post starts out published.
    pub async fn create(&self, input: CreatePostInput) -> Result<Post, PostServiceError> {
        if input.title.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let slug = match input.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => generate_slug(s),
            None => generate_slug(&input.title),
        };
        if slug.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Cannot derive a slug from the title".to_string(),
            ));
        }

        if self
            .repo
            .slug_exists(&slug, None)
            .await
            .context("Failed to check slug")?
        {
            return Err(PostServiceError::SlugExists(slug));
        }

        let status = input.status.unwrap_or_default();
        let now = Utc::now();
        let post = Post {
            id: 0,
            slug,
            title: input.title,
            excerpt: input.excerpt,
            content_html: render_markdown(&input.content),
            content: input.content,
            tags: input.tags,
            status,
            published_at: (status == PostStatus::Published).then_some(now),
            view_count: 0,
            like_count: 0,
            favorite_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };

        Ok(self.repo.create(&post).await.context("Failed to create post")?)
    }

    /// Get a published post by slug for the public site
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Post, PostServiceError> {
        let post = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to fetch post")?
            .ok_or(PostServiceError::NotFound)?;

        if post.status != PostStatus::Published {
            return Err(PostServiceError::NotFound);
        }
        Ok(post)
    }

    /// Get any post by id (admin)
    pub async fn get_by_id(&self, id: i64) -> Result<Post, PostServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to fetch post")?
            .ok_or(PostServiceError::NotFound)
    }

    /// List published posts for the public site
    pub async fn list_published(
        &self,
        tag: Option<String>,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let filter = PostFilter {
            tag,
            status: Some(PostStatus::Published),
        };
        Ok(self
            .repo
            .list(&filter, params)
            .await
            .context("Failed to list posts")?)
    }

    /// List all posts regardless of status (admin)
    pub async fn list_all(&self, params: &ListParams) -> Result<PagedResult<Post>, PostServiceError> {
        Ok(self
            .repo
            .list(&PostFilter::default(), params)
            .await
            .context("Failed to list posts")?)
    }

    /// Apply a partial update; re-renders markdown when content changes
    /// and stamps published_at on the first transition to published.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        if !input.has_changes() {
            return Err(PostServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        let mut post = self.get_by_id(id).await?;

        if let Some(slug) = input.slug {
            let slug = generate_slug(&slug);
            if slug.is_empty() {
                return Err(PostServiceError::ValidationError(
                    "Slug cannot be empty".to_string(),
                ));
            }
            if self
                .repo
                .slug_exists(&slug, Some(id))
                .await
                .context("Failed to check slug")?
            {
                return Err(PostServiceError::SlugExists(slug));
            }
            post.slug = slug;
        }
        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(PostServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            post.title = title;
        }
        if let Some(excerpt) = input.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = input.content {
            post.content_html = render_markdown(&content);
            post.content = content;
        }
        if let Some(tags) = input.tags {
            post.tags = tags;
        }
        if let Some(status) = input.status {
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }

        Ok(self.repo.update(&post).await.context("Failed to update post")?)
    }

    /// Delete a post
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        let deleted = self.repo.delete(id).await.context("Failed to delete post")?;
        if !deleted {
            return Err(PostServiceError::NotFound);
        }
        Ok(())
    }

    /// Record a view, best-effort
    pub async fn record_view(&self, id: i64) {
        if let Err(e) = self.repo.increment_view(id).await {
            tracing::debug!("Failed to record post view for {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxPostRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> PostService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        PostService::new(SqlxPostRepository::boxed(pool))
    }

    fn create_input(title: &str, status: PostStatus) -> CreatePostInput {
        CreatePostInput {
            slug: None,
            title: title.to_string(),
            excerpt: "Excerpt".to_string(),
            content: "# Heading\n\nBody with **bold**.".to_string(),
            tags: vec!["rust".to_string()],
            status: Some(status),
        }
    }

    #[tokio::test]
    async fn test_create_renders_markdown() {
        let service = setup().await;
        let post = service
            .create(create_input("Writing Rust", PostStatus::Published))
            .await
            .expect("create failed");

        assert_eq!(post.slug, "writing-rust");
        assert!(post.content_html.contains("<h1>"));
        assert!(post.content_html.contains("<strong>bold</strong>"));
        assert!(post.published_at.is_some());
    }

    #[tokio::test]
    async fn test_draft_has_no_published_at() {
        let service = setup().await;
        let post = service
            .create(create_input("Draft", PostStatus::Draft))
            .await
            .unwrap();
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn test_publishing_draft_stamps_published_at() {
        let service = setup().await;
        let post = service
            .create(create_input("Later", PostStatus::Draft))
            .await
            .unwrap();

        let updated = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.published_at.is_some());

        // Unpublishing then republishing keeps the original timestamp
        let original = updated.published_at;
        service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let republished = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(republished.published_at, original);
    }

    #[tokio::test]
    async fn test_duplicate_slug_fails() {
        let service = setup().await;
        service
            .create(create_input("Same Title", PostStatus::Draft))
            .await
            .unwrap();
        let result = service.create(create_input("Same Title", PostStatus::Draft)).await;
        assert!(matches!(result, Err(PostServiceError::SlugExists(_))));
    }

    #[tokio::test]
    async fn test_update_content_rerenders_html() {
        let service = setup().await;
        let post = service
            .create(create_input("Evolving", PostStatus::Published))
            .await
            .unwrap();

        let updated = service
            .update(
                post.id,
                UpdatePostInput {
                    content: Some("New *italic* body".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.content_html.contains("<em>italic</em>"));
        assert!(!updated.content_html.contains("<h1>"));
    }

    #[tokio::test]
    async fn test_draft_hidden_from_public_lookup() {
        let service = setup().await;
        service.create(create_input("Hidden", PostStatus::Draft)).await.unwrap();
        let result = service.get_published_by_slug("hidden").await;
        assert!(matches!(result, Err(PostServiceError::NotFound)));
    }
}
