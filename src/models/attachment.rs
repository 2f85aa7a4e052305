//! File attachment model
//!
//! Attachments are uploaded files linked to either a project or a blog
//! post. The two owner kinds live in separate tables (`project_files`,
//! `post_files`) with identical shapes; `AttachmentOwner` selects the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which entity owns an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentOwner {
    Project,
    Post,
}

impl AttachmentOwner {
    /// Table holding attachments for this owner kind
    pub fn table(&self) -> &'static str {
        match self {
            Self::Project => "project_files",
            Self::Post => "post_files",
        }
    }

    /// Foreign key column pointing at the owner
    pub fn owner_column(&self) -> &'static str {
        match self {
            Self::Project => "project_id",
            Self::Post => "post_id",
        }
    }
}

impl std::fmt::Display for AttachmentOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Post => write!(f, "post"),
        }
    }
}

impl std::str::FromStr for AttachmentOwner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "post" => Ok(Self::Post),
            _ => Err(format!("Invalid attachment owner: {}", s)),
        }
    }
}

/// Stored attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub owner: AttachmentOwner,
    pub owner_id: i64,
    /// Path relative to the uploads directory, e.g. "documents/abc.pdf"
    pub stored_path: String,
    /// Original client-side filename
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for registering an uploaded file as an attachment
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub owner: AttachmentOwner,
    pub owner_id: i64,
    pub stored_path: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_table_mapping() {
        assert_eq!(AttachmentOwner::Project.table(), "project_files");
        assert_eq!(AttachmentOwner::Post.table(), "post_files");
        assert_eq!(AttachmentOwner::Project.owner_column(), "project_id");
        assert_eq!(AttachmentOwner::Post.owner_column(), "post_id");
    }

    #[test]
    fn test_owner_roundtrip() {
        for owner in [AttachmentOwner::Project, AttachmentOwner::Post] {
            let parsed: AttachmentOwner = owner.to_string().parse().unwrap();
            assert_eq!(parsed, owner);
        }
    }
}
