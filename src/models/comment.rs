//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::interaction::TargetKind;

/// Comment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Spam,
}

impl Default for CommentStatus {
    fn default() -> Self {
        Self::Approved
    }
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Spam => write!(f, "spam"),
        }
    }
}

impl std::str::FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "spam" => Ok(Self::Spam),
            _ => Err(format!("Invalid comment status: {}", s)),
        }
    }
}

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub target_kind: TargetKind,
    pub target_id: i64,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub content: String,
    pub status: CommentStatus,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with additional info for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithMeta {
    pub id: i64,
    pub target_kind: TargetKind,
    pub target_id: i64,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub nickname: Option<String>,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub avatar_url: String,
    pub like_count: i64,
    pub is_liked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub replies: Vec<CommentWithMeta>,
}

impl CommentWithMeta {
    /// Generate Gravatar URL from email
    pub fn gravatar_url(email: &Option<String>) -> String {
        match email {
            Some(e) if !e.is_empty() => {
                let hash = format!("{:x}", md5::compute(e.trim().to_lowercase()));
                format!("https://www.gravatar.com/avatar/{}?d=mp&s=80", hash)
            }
            _ => "https://www.gravatar.com/avatar/?d=mp&s=80".to_string(),
        }
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub target_kind: TargetKind,
    pub target_id: i64,
    pub parent_id: Option<i64>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_url_for_email() {
        let url = CommentWithMeta::gravatar_url(&Some("Visitor@Example.com ".to_string()));
        // md5 of "visitor@example.com" (trimmed, lowercased)
        assert!(url.starts_with("https://www.gravatar.com/avatar/"));
        assert!(url.ends_with("?d=mp&s=80"));
        assert_ne!(url, CommentWithMeta::gravatar_url(&None));
    }

    #[test]
    fn test_gravatar_url_default() {
        assert_eq!(
            CommentWithMeta::gravatar_url(&None),
            "https://www.gravatar.com/avatar/?d=mp&s=80"
        );
        assert_eq!(
            CommentWithMeta::gravatar_url(&Some(String::new())),
            "https://www.gravatar.com/avatar/?d=mp&s=80"
        );
    }

    #[test]
    fn test_gravatar_normalizes_case_and_whitespace() {
        let a = CommentWithMeta::gravatar_url(&Some("User@Host.com".to_string()));
        let b = CommentWithMeta::gravatar_url(&Some("  user@host.com  ".to_string()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [CommentStatus::Pending, CommentStatus::Approved, CommentStatus::Spam] {
            let parsed: CommentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
