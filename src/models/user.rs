//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User role
///
/// Authorization is a single binary check: admins manage content,
/// everyone else can comment, like, and favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given parameters
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            username,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this user has the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Admin, UserRole::User] {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_invalid_role_rejected() {
        assert!("editor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_is_admin() {
        let admin = User::new("a".into(), "a@x.com".into(), "h".into(), UserRole::Admin);
        let user = User::new("b".into(), "b@x.com".into(), "h".into(), UserRole::User);
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
