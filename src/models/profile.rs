//! Profile model
//!
//! The profile is a single-row entity: the site owner's public identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    /// Public display name
    pub display_name: String,
    /// One-line headline, e.g. "Systems engineer"
    pub headline: String,
    /// Longer biography (markdown allowed, rendered client-side)
    pub bio: String,
    /// Avatar image URL
    pub avatar: Option<String>,
    /// Location string
    pub location: Option<String>,
    /// Public contact email
    pub email: Option<String>,
    /// Social links keyed by platform name (JSON object)
    pub social_links: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Input for updating the profile (full replacement of provided fields)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileInput {
    pub display_name: String,
    pub headline: String,
    #[serde(default)]
    pub bio: String,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    #[serde(default = "default_social_links")]
    pub social_links: serde_json::Value,
}

fn default_social_links() -> serde_json::Value {
    serde_json::json!({})
}
