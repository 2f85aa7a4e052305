//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session entity
///
/// The `id` is the opaque token handed to the client as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_session_not_expired() {
        let session = Session {
            id: "tok".to_string(),
            user_id: 1,
            expires_at: Utc::now() + Duration::days(7),
            created_at: Utc::now(),
        };
        assert!(!session.is_expired());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let session = Session {
            id: "tok".to_string(),
            user_id: 1,
            expires_at: Utc::now() - Duration::seconds(1),
            created_at: Utc::now() - Duration::days(8),
        };
        assert!(session.is_expired());
    }
}
