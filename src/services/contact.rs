//! Contact and guestbook service

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::ContactRepository;
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::{ContactMessage, CreateContactInput, CreateGuestbookInput, GuestbookMessage};

/// Error types for contact service operations
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Contact and guestbook service
pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    /// Store a contact form submission
    pub async fn submit_contact(
        &self,
        input: CreateContactInput,
    ) -> Result<ContactMessage, ContactServiceError> {
        if input.name.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Name is required".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(ContactServiceError::ValidationError(
                "A valid email is required".to_string(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Message body is required".to_string(),
            ));
        }

        Ok(self
            .repo
            .create_contact(&input)
            .await
            .context("Failed to store contact message")?)
    }

    /// Admin inbox listing
    pub async fn list_contact(
        &self,
        unread_only: bool,
        params: &ListParams,
    ) -> Result<PagedResult<ContactMessage>, ContactServiceError> {
        Ok(self
            .repo
            .list_contact(unread_only, params)
            .await
            .context("Failed to list contact messages")?)
    }

    /// Mark a contact message read
    pub async fn mark_read(&self, id: i64) -> Result<(), ContactServiceError> {
        if !self.repo.mark_read(id).await.context("Failed to mark read")? {
            return Err(ContactServiceError::NotFound);
        }
        Ok(())
    }

    /// Delete a contact message
    pub async fn delete_contact(&self, id: i64) -> Result<(), ContactServiceError> {
        if !self
            .repo
            .delete_contact(id)
            .await
            .context("Failed to delete contact message")?
        {
            return Err(ContactServiceError::NotFound);
        }
        Ok(())
    }

    /// Store a guestbook message
    pub async fn sign_guestbook(
        &self,
        input: CreateGuestbookInput,
    ) -> Result<GuestbookMessage, ContactServiceError> {
        if input.nickname.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Nickname is required".to_string(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Message body is required".to_string(),
            ));
        }

        Ok(self
            .repo
            .create_guestbook(&input)
            .await
            .context("Failed to store guestbook message")?)
    }

    /// Public guestbook listing
    pub async fn list_guestbook(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<GuestbookMessage>, ContactServiceError> {
        Ok(self
            .repo
            .list_guestbook(params)
            .await
            .context("Failed to list guestbook")?)
    }

    /// Delete a guestbook message
    pub async fn delete_guestbook(&self, id: i64) -> Result<(), ContactServiceError> {
        if !self
            .repo
            .delete_guestbook(id)
            .await
            .context("Failed to delete guestbook message")?
        {
            return Err(ContactServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContactRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> ContactService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContactService::new(SqlxContactRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_contact_validation() {
        let service = setup().await;

        for (name, email, body) in [
            ("", "a@b.com", "hi"),
            ("Alex", "not-an-email", "hi"),
            ("Alex", "a@b.com", "  "),
        ] {
            let result = service
                .submit_contact(CreateContactInput {
                    name: name.to_string(),
                    email: email.to_string(),
                    subject: String::new(),
                    body: body.to_string(),
                })
                .await;
            assert!(matches!(result, Err(ContactServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_contact_submit_and_read_flow() {
        let service = setup().await;
        let msg = service
            .submit_contact(CreateContactInput {
                name: "Alex".to_string(),
                email: "alex@example.com".to_string(),
                subject: "Work".to_string(),
                body: "Hello".to_string(),
            })
            .await
            .unwrap();

        service.mark_read(msg.id).await.unwrap();
        assert!(matches!(
            service.mark_read(9999).await,
            Err(ContactServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_guestbook_validation_and_flow() {
        let service = setup().await;

        let bad = service
            .sign_guestbook(CreateGuestbookInput {
                nickname: " ".to_string(),
                body: "hi".to_string(),
            })
            .await;
        assert!(matches!(bad, Err(ContactServiceError::ValidationError(_))));

        let msg = service
            .sign_guestbook(CreateGuestbookInput {
                nickname: "visitor".to_string(),
                body: "hello".to_string(),
            })
            .await
            .unwrap();

        let page = service.list_guestbook(&ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);

        service.delete_guestbook(msg.id).await.unwrap();
    }
}
