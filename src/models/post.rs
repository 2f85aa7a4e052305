//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Post title
    pub title: String,
    /// Short excerpt shown in list views
    pub excerpt: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content
    pub content_html: String,
    /// Free-form tags (JSON array of strings)
    pub tags: Vec<String>,
    /// Publication status
    pub status: PostStatus,
    /// Publication timestamp, set when first published
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub favorite_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    /// URL-friendly slug; generated from the title when empty
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<PostStatus>,
}

/// Input for updating an existing post; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

impl UpdatePostInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.slug.is_some()
            || self.title.is_some()
            || self.excerpt.is_some()
            || self.content.is_some()
            || self.tags.is_some()
            || self.status.is_some()
    }
}

/// Filters for public post listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    /// Only posts carrying this tag
    pub tag: Option<String>,
    /// Restrict to a status (admin listings pass None for all)
    pub status: Option<PostStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [PostStatus::Draft, PostStatus::Published] {
            assert_eq!(PostStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::parse("pending"), None);
    }
}
