//! Skill model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Skill entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    /// Skill name, e.g. "Rust"
    pub name: String,
    /// Grouping label, e.g. "Backend", "Tooling"
    pub category: String,
    /// Proficiency 0-100
    pub level: i32,
    /// Display ordering within the category (lower = earlier)
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a skill
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSkillInput {
    pub name: String,
    pub category: String,
    pub level: i32,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input for updating a skill; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSkillInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub level: Option<i32>,
    pub sort_order: Option<i32>,
}

impl UpdateSkillInput {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.category.is_some()
            || self.level.is_some()
            || self.sort_order.is_some()
    }
}
