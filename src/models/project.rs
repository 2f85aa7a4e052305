//! Project model
//!
//! This module provides:
//! - `Project` entity representing a portfolio project
//! - `ProjectStatus` enum for publication states
//! - Input types for creating and updating projects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Draft - not visible to public
    Draft,
    /// Published - visible to public
    Published,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ProjectStatus::Draft),
            "published" => Some(ProjectStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Project title
    pub title: String,
    /// Short one-paragraph summary for list views
    pub summary: String,
    /// Full description
    pub description: String,
    /// Technologies used (JSON array of strings)
    pub tech_stack: Vec<String>,
    /// Source repository URL
    pub repo_url: Option<String>,
    /// Live demo URL
    pub demo_url: Option<String>,
    /// Cover image URL
    pub cover_image: Option<String>,
    /// Publication status
    pub status: ProjectStatus,
    /// Whether the project is highlighted on the home page
    pub featured: bool,
    /// Display ordering (lower = earlier)
    pub sort_order: i32,
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

/// Input for creating a new project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectInput {
    /// URL-friendly slug; generated from the title when empty
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    pub summary: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
    pub cover_image: Option<String>,
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input for updating an existing project; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub repo_url: Option<Option<String>>,
    pub demo_url: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub featured: Option<bool>,
    pub sort_order: Option<i32>,
}

impl UpdateProjectInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.slug.is_some()
            || self.title.is_some()
            || self.summary.is_some()
            || self.description.is_some()
            || self.tech_stack.is_some()
            || self.repo_url.is_some()
            || self.demo_url.is_some()
            || self.cover_image.is_some()
            || self.status.is_some()
            || self.featured.is_some()
            || self.sort_order.is_some()
    }
}

/// Filters for public project listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    /// Only featured projects
    pub featured: Option<bool>,
    /// Only projects using this technology
    pub tech: Option<String>,
    /// Restrict to a status (admin listings pass None for all)
    pub status: Option<ProjectStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [ProjectStatus::Draft, ProjectStatus::Published] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::parse("archived"), None);
    }

    #[test]
    fn test_update_input_has_changes() {
        assert!(!UpdateProjectInput::default().has_changes());
        let input = UpdateProjectInput {
            title: Some("New".to_string()),
            ..Default::default()
        };
        assert!(input.has_changes());
    }
}
