//! Profile service

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::ProfileRepository;
use crate::models::{Profile, UpdateProfileInput};

/// Error types for profile service operations
#[derive(Debug, thiserror::Error)]
pub enum ProfileServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Profile not set up")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Profile service
pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepository>) -> Self {
        Self { repo }
    }

    /// Fetch the profile; `NotFound` until the admin first saves it
    pub async fn get(&self) -> Result<Profile, ProfileServiceError> {
        self.repo
            .get()
            .await
            .context("Failed to fetch profile")?
            .ok_or(ProfileServiceError::NotFound)
    }

    /// Create or replace the profile
    pub async fn update(&self, input: UpdateProfileInput) -> Result<Profile, ProfileServiceError> {
        if input.display_name.trim().is_empty() {
            return Err(ProfileServiceError::ValidationError(
                "Display name cannot be empty".to_string(),
            ));
        }
        if !input.social_links.is_object() {
            return Err(ProfileServiceError::ValidationError(
                "Social links must be an object".to_string(),
            ));
        }

        Ok(self
            .repo
            .upsert(&input)
            .await
            .context("Failed to save profile")?)
    }
}
