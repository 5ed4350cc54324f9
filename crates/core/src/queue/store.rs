//! Queue storage trait and request types.

use thiserror::Error;

use super::{QueueStatus, QueueTicket};

/// Error type for queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Malformed input.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced ticket missing, or no waiting ticket to call.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The state machine rejects the requested move.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new queue ticket.
#[derive(Debug, Clone)]
pub struct CreateQueueTicketRequest {
    pub applicant_id: String,
    /// Help category picked at the kiosk.
    pub category_id: String,
}

impl CreateQueueTicketRequest {
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.applicant_id.trim().is_empty() {
            return Err(QueueError::Validation(
                "applicant_id cannot be empty".to_string(),
            ));
        }
        if self.category_id.trim().is_empty() {
            return Err(QueueError::Validation(
                "category_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Filter for querying queue tickets.
#[derive(Debug, Clone, Default)]
pub struct QueueFilter {
    /// Filter by status.
    pub status: Option<QueueStatus>,
    /// Filter by counter.
    pub counter_id: Option<String>,
    /// Filter by applicant.
    pub applicant_id: Option<String>,
    /// Only tickets created today (UTC).
    pub today_only: bool,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl QueueFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            counter_id: None,
            applicant_id: None,
            today_only: false,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: QueueStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_counter_id(mut self, counter_id: impl Into<String>) -> Self {
        self.counter_id = Some(counter_id.into());
        self
    }

    pub fn with_applicant_id(mut self, applicant_id: impl Into<String>) -> Self {
        self.applicant_id = Some(applicant_id.into());
        self
    }

    pub fn today_only(mut self) -> Self {
        self.today_only = true;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for queue storage backends.
pub trait QueueStore: Send + Sync {
    /// Create a waiting ticket with the next per-day queue number.
    fn create(&self, request: CreateQueueTicketRequest) -> Result<QueueTicket, QueueError>;

    /// Get a queue ticket by ID.
    fn get(&self, id: &str) -> Result<Option<QueueTicket>, QueueError>;

    /// List queue tickets matching the filter, FIFO order.
    fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueTicket>, QueueError>;

    /// Count queue tickets matching the filter.
    fn count(&self, filter: &QueueFilter) -> Result<i64, QueueError>;

    /// Call the oldest waiting ticket to the counter. Fails when the
    /// counter already holds a called or serving ticket, or when nothing
    /// is waiting. The busy check and the claim happen in one transaction.
    fn call_next(&self, counter_id: &str, operator_id: &str) -> Result<QueueTicket, QueueError>;

    /// Re-stamp a called/serving ticket so the announcement fires again.
    /// Not a state transition.
    fn recall(&self, id: &str) -> Result<QueueTicket, QueueError>;

    /// `called -> serving`.
    fn start_serving(&self, id: &str) -> Result<QueueTicket, QueueError>;

    /// `serving -> completed`, stamps `completed_at`.
    fn complete(&self, id: &str) -> Result<QueueTicket, QueueError>;

    /// `called|serving -> skipped`, stamps `completed_at`.
    fn skip(&self, id: &str) -> Result<QueueTicket, QueueError>;
}
