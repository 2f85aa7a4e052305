//! User service
//!
//! Business logic for user management:
//! - Registration (the first user becomes the admin)
//! - Login/logout with session tokens
//! - Session validation with lazy expiry cleanup

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a service with custom session expiration (used by tests)
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user.
    ///
    /// The first user in the system is assigned the admin role; everyone
    /// after that registers as a regular user.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let role = if self.is_first_user().await? {
            UserRole::Admin
        } else {
            UserRole::User
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash, role);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Login with credentials; creates a new session when valid.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        self.create_session(user.id).await
    }

    /// Logout (invalidate the session token)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Validate a session token and return the associated user.
    ///
    /// Expired sessions are deleted lazily and validate to `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Change a user's password after verifying the current one
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if new_password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "New password cannot be empty".to_string(),
            ));
        }

        let valid = verify_password(current_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut updated = user.clone();
        updated.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&updated)
            .await
            .context("Failed to update user")?;
        Ok(())
    }

    /// Check if this is the first user (for auto-admin)
    pub async fn is_first_user(&self) -> Result<bool, UserServiceError> {
        let count = self.user_repo.count().await.context("Failed to count users")?;
        Ok(count == 0)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    /// Delete all expired sessions; returns the number removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }
        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        Ok(self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);
        UserService::new(user_repo, session_repo)
    }

    async fn setup_with_expiration(days: i64) -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);
        UserService::with_session_expiration(user_repo, session_repo, days)
    }

    // ========================================================================
    // Registration tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_first_user_becomes_admin() {
        let service = setup_test_service().await;

        let input = RegisterInput::new("admin", "admin@example.com", "password123");
        let user = service.register(input).await.expect("Failed to register");

        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.username, "admin");
    }

    #[tokio::test]
    async fn test_register_second_user_is_regular() {
        let service = setup_test_service().await;

        service
            .register(RegisterInput::new("admin", "admin@example.com", "password123"))
            .await
            .expect("Failed to register first user");

        let user = service
            .register(RegisterInput::new("visitor", "visitor@example.com", "password456"))
            .await
            .expect("Failed to register second user");

        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let service = setup_test_service().await;

        service
            .register(RegisterInput::new("testuser", "user1@example.com", "password123"))
            .await
            .expect("Failed to register first user");

        let result = service
            .register(RegisterInput::new("testuser", "user2@example.com", "password456"))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let service = setup_test_service().await;

        service
            .register(RegisterInput::new("user1", "same@example.com", "password123"))
            .await
            .expect("Failed to register first user");

        let result = service
            .register(RegisterInput::new("user2", "same@example.com", "password456"))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_input_fails() {
        let service = setup_test_service().await;

        for input in [
            RegisterInput::new("", "test@example.com", "password123"),
            RegisterInput::new("testuser", "", "password123"),
            RegisterInput::new("testuser", "test@example.com", ""),
            RegisterInput::new("testuser", "invalid-email", "password123"),
        ] {
            let result = service.register(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    // ========================================================================
    // Login and session tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_with_username_and_email() {
        let service = setup_test_service().await;

        service
            .register(RegisterInput::new("testuser", "test@example.com", "password123"))
            .await
            .expect("Failed to register");

        let by_username = service
            .login(LoginInput::new("testuser", "password123"))
            .await
            .expect("Login by username failed");
        assert!(!by_username.is_expired());

        let by_email = service
            .login(LoginInput::new("test@example.com", "password123"))
            .await
            .expect("Login by email failed");
        assert_ne!(by_username.id, by_email.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let service = setup_test_service().await;

        service
            .register(RegisterInput::new("testuser", "test@example.com", "password123"))
            .await
            .expect("Failed to register");

        let result = service.login(LoginInput::new("testuser", "wrongpassword")).await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_nonexistent_user_fails() {
        let service = setup_test_service().await;

        let result = service.login(LoginInput::new("nonexistent", "password123")).await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_validate_session_roundtrip() {
        let service = setup_test_service().await;

        let registered = service
            .register(RegisterInput::new("testuser", "test@example.com", "password123"))
            .await
            .expect("Failed to register");

        let session = service
            .login(LoginInput::new("testuser", "password123"))
            .await
            .expect("Failed to login");

        let user = service
            .validate_session(&session.id)
            .await
            .expect("Validation errored")
            .expect("Session should be valid");
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_validate_unknown_session_returns_none() {
        let service = setup_test_service().await;
        let result = service
            .validate_session("nonexistent-session-id")
            .await
            .expect("Validation errored");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_session_returns_none() {
        let service = setup_with_expiration(-1).await;

        service
            .register(RegisterInput::new("testuser", "test@example.com", "password123"))
            .await
            .expect("Failed to register");

        let session = service
            .login(LoginInput::new("testuser", "password123"))
            .await
            .expect("Failed to login");

        assert!(session.is_expired());
        let result = service
            .validate_session(&session.id)
            .await
            .expect("Validation errored");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup_test_service().await;

        service
            .register(RegisterInput::new("testuser", "test@example.com", "password123"))
            .await
            .expect("Failed to register");

        let session = service
            .login(LoginInput::new("testuser", "password123"))
            .await
            .expect("Failed to login");

        service.logout(&session.id).await.expect("Failed to logout");

        assert!(service
            .validate_session(&session.id)
            .await
            .expect("Validation errored")
            .is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let service = setup_with_expiration(-1).await;

        service
            .register(RegisterInput::new("testuser", "test@example.com", "password123"))
            .await
            .expect("Failed to register");
        service
            .login(LoginInput::new("testuser", "password123"))
            .await
            .expect("Failed to login");

        let count = service
            .cleanup_expired_sessions()
            .await
            .expect("Failed to cleanup");
        assert_eq!(count, 1);
    }

    // ========================================================================
    // Password change tests
    // ========================================================================

    #[tokio::test]
    async fn test_change_password() {
        let service = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("testuser", "test@example.com", "oldpass"))
            .await
            .expect("Failed to register");

        service
            .change_password(&user, "oldpass", "newpass")
            .await
            .expect("Password change failed");

        assert!(service.login(LoginInput::new("testuser", "oldpass")).await.is_err());
        assert!(service.login(LoginInput::new("testuser", "newpass")).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_fails() {
        let service = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("testuser", "test@example.com", "oldpass"))
            .await
            .expect("Failed to register");

        let result = service.change_password(&user, "wrong", "newpass").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }
}
