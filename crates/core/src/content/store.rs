//! Announcement storage trait and request types.

use thiserror::Error;

use super::Announcement;

/// Error type for content operations.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create an announcement.
#[derive(Debug, Clone)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
    pub published: bool,
}

impl CreateAnnouncementRequest {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.title.trim().is_empty() {
            return Err(ContentError::Validation("title cannot be empty".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(ContentError::Validation("body cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Partial update for an announcement. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
}

/// Trait for announcement storage backends.
pub trait ContentStore: Send + Sync {
    /// Create an announcement.
    fn create(&self, request: CreateAnnouncementRequest) -> Result<Announcement, ContentError>;

    /// Get an announcement by ID.
    fn get(&self, id: &str) -> Result<Option<Announcement>, ContentError>;

    /// List announcements, newest first. `published_only` hides drafts.
    fn list(&self, published_only: bool) -> Result<Vec<Announcement>, ContentError>;

    /// Update an announcement.
    fn update(
        &self,
        id: &str,
        request: UpdateAnnouncementRequest,
    ) -> Result<Announcement, ContentError>;

    /// Delete an announcement.
    fn delete(&self, id: &str) -> Result<Announcement, ContentError>;
}
