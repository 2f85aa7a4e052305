//! Comment service

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::CommentRepository;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::{Comment, CommentStatus, CommentWithMeta, CreateCommentInput, TargetKind};

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Comment not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    /// When true, new comments start pending instead of approved
    moderated: bool,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, moderated: bool) -> Self {
        Self { repo, moderated }
    }

    /// Create a comment.
    ///
    /// Guests must provide a nickname; content must be non-empty. A
    /// reply's parent must exist on the same target.
    pub async fn create(
        &self,
        input: CreateCommentInput,
        user_id: Option<i64>,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Comment, CommentServiceError> {
        if input.content.trim().is_empty() {
            return Err(CommentServiceError::ValidationError(
                "Content is required".to_string(),
            ));
        }

        if user_id.is_none()
            && input
                .nickname
                .as_ref()
                .map(|n| n.trim().is_empty())
                .unwrap_or(true)
        {
            return Err(CommentServiceError::ValidationError(
                "Nickname is required for guest comments".to_string(),
            ));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .repo
                .get_by_id(parent_id)
                .await
                .context("Failed to fetch parent comment")?
                .ok_or_else(|| {
                    CommentServiceError::ValidationError("Parent comment not found".to_string())
                })?;
            if parent.target_kind != input.target_kind || parent.target_id != input.target_id {
                return Err(CommentServiceError::ValidationError(
                    "Parent comment belongs to a different target".to_string(),
                ));
            }
        }

        let status = if self.moderated {
            CommentStatus::Pending
        } else {
            CommentStatus::Approved
        };

        Ok(self
            .repo
            .create(input, user_id, ip, user_agent, status)
            .await
            .context("Failed to create comment")?)
    }

    /// Approved comments for a target, threaded
    pub async fn get_by_target(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        fingerprint: Option<&str>,
    ) -> Result<Vec<CommentWithMeta>, CommentServiceError> {
        Ok(self
            .repo
            .get_by_target(target_kind, target_id, fingerprint)
            .await
            .context("Failed to fetch comments")?)
    }

    /// Moderation queue (admin)
    pub async fn list_pending(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<CommentWithMeta>, CommentServiceError> {
        Ok(self
            .repo
            .list_by_status(CommentStatus::Pending, params)
            .await
            .context("Failed to list pending comments")?)
    }

    /// Change a comment's moderation status (admin)
    pub async fn set_status(
        &self,
        id: i64,
        status: CommentStatus,
    ) -> Result<(), CommentServiceError> {
        let updated = self
            .repo
            .update_status(id, status)
            .await
            .context("Failed to update comment status")?;
        if !updated {
            return Err(CommentServiceError::NotFound);
        }
        Ok(())
    }

    /// Delete a comment (admin)
    pub async fn delete(&self, id: i64) -> Result<(), CommentServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        if !deleted {
            return Err(CommentServiceError::NotFound);
        }
        Ok(())
    }
}

/// Derive an anonymous identity fingerprint from IP and user agent
pub fn generate_fingerprint(ip: &str, user_agent: &str) -> String {
    let data = format!("{}:{}", ip, user_agent);
    format!("{:x}", md5::compute(data))
}
