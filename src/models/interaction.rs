//! Like and favorite models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target of a like, favorite, or comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Project,
    Post,
    Comment,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Post => write!(f, "post"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            _ => Err(format!("Invalid target kind: {}", s)),
        }
    }
}

/// Like entity
///
/// Identified either by a user id (logged in) or by a browser
/// fingerprint (anonymous); exactly one of the two is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub target_kind: TargetKind,
    pub target_id: i64,
    pub user_id: Option<i64>,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Favorite entity; always tied to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub target_kind: TargetKind,
    pub target_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
