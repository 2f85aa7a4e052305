//! Like and favorite service

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::db::repositories::InteractionRepository;
use crate::models::{Favorite, TargetKind};

/// Result of a toggle operation
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    /// Whether the identity now likes/favorites the target
    pub active: bool,
    /// Like count after the toggle (0 for favorites on comments)
    pub count: i64,
}

/// Like and favorite service
pub struct InteractionService {
    repo: Arc<dyn InteractionRepository>,
}

impl InteractionService {
    pub fn new(repo: Arc<dyn InteractionRepository>) -> Self {
        Self { repo }
    }

    /// Toggle a like for the given identity.
    ///
    /// Exactly one of `user_id` / `fingerprint` identifies the caller.
    pub async fn toggle_like(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<String>,
    ) -> Result<ToggleOutcome> {
        let liked = self
            .repo
            .is_liked(target_kind, target_id, user_id, fingerprint.as_deref())
            .await
            .context("Failed to check like")?;

        if liked {
            self.repo
                .remove_like(target_kind, target_id, user_id, fingerprint)
                .await
                .context("Failed to remove like")?;
        } else {
            self.repo
                .add_like(target_kind, target_id, user_id, fingerprint)
                .await
                .context("Failed to add like")?;
        }

        let count = self
            .repo
            .like_count(target_kind, target_id)
            .await
            .context("Failed to count likes")?;

        Ok(ToggleOutcome {
            active: !liked,
            count,
        })
    }

    /// Check whether the identity has liked the target
    pub async fn is_liked(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: Option<i64>,
        fingerprint: Option<&str>,
    ) -> Result<bool> {
        self.repo
            .is_liked(target_kind, target_id, user_id, fingerprint)
            .await
    }

    /// Toggle a favorite for a logged-in user
    pub async fn toggle_favorite(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: i64,
    ) -> Result<ToggleOutcome> {
        let favorited = self
            .repo
            .is_favorited(target_kind, target_id, user_id)
            .await
            .context("Failed to check favorite")?;

        if favorited {
            self.repo
                .remove_favorite(target_kind, target_id, user_id)
                .await
                .context("Failed to remove favorite")?;
        } else {
            self.repo
                .add_favorite(target_kind, target_id, user_id)
                .await
                .context("Failed to add favorite")?;
        }

        Ok(ToggleOutcome {
            active: !favorited,
            count: 0,
        })
    }

    /// Check whether the user has favorited the target
    pub async fn is_favorited(
        &self,
        target_kind: TargetKind,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        self.repo.is_favorited(target_kind, target_id, user_id).await
    }

    /// List a user's favorites
    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<Favorite>> {
        self.repo.list_favorites(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ProjectRepository, SqlxInteractionRepository, SqlxProjectRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Project, ProjectStatus, User, UserRole};
    use chrono::Utc;

    async fn setup() -> (InteractionService, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "fan".into(),
                "fan@example.com".into(),
                "hash".into(),
                UserRole::User,
            ))
            .await
            .unwrap();

        let projects = SqlxProjectRepository::new(pool.clone());
        let now = Utc::now();
        let project = projects
            .create(&Project {
                id: 0,
                slug: "t".to_string(),
                title: "T".to_string(),
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

        (
            InteractionService::new(SqlxInteractionRepository::boxed(pool)),
            project.id,
            user.id,
        )
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let (service, project_id, user_id) = setup().await;

        let on = service
            .toggle_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap();
        assert!(on.active);
        assert_eq!(on.count, 1);

        let off = service
            .toggle_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap();
        assert!(!off.active);
        assert_eq!(off.count, 0);
    }

    #[tokio::test]
    async fn test_two_identities_count_separately() {
        let (service, project_id, user_id) = setup().await;

        service
            .toggle_like(TargetKind::Project, project_id, Some(user_id), None)
            .await
            .unwrap();
        let anon = service
            .toggle_like(TargetKind::Project, project_id, None, Some("fp1".to_string()))
            .await
            .unwrap();
        assert_eq!(anon.count, 2);
    }

    #[tokio::test]
    async fn test_toggle_favorite_round_trip() {
        let (service, project_id, user_id) = setup().await;

        let on = service
            .toggle_favorite(TargetKind::Project, project_id, user_id)
            .await
            .unwrap();
        assert!(on.active);
        assert!(service
            .is_favorited(TargetKind::Project, project_id, user_id)
            .await
            .unwrap());

        let off = service
            .toggle_favorite(TargetKind::Project, project_id, user_id)
            .await
            .unwrap();
        assert!(!off.active);
        assert!(service.list_favorites(user_id).await.unwrap().is_empty());
    }
}
