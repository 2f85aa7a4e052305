//! Contact and guestbook message models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact form submission, visible only in the admin inbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a contact message
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
}

/// Public guestbook message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestbookMessage {
    pub id: i64,
    pub nickname: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a guestbook message
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGuestbookInput {
    pub nickname: String,
    pub body: String,
}
