use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A portal announcement maintained by the content team.
///
/// Applicants only see published rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    /// Unique identifier (UUID).
    pub id: String,

    pub title: String,
    pub body: String,
    pub published: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_serialization_roundtrip() {
        let announcement = Announcement {
            id: "n-1".to_string(),
            title: "Enrollment opens Monday".to_string(),
            body: "Doors open at 8am.".to_string(),
            published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&announcement).unwrap();
        let deserialized: Announcement = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, announcement);
    }
}
