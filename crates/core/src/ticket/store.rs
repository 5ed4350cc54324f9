//! Ticket storage trait and types.

use std::fmt;

use crate::auth::Role;
use crate::ticket::{Ticket, TicketMessage, TicketPriority, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug)]
pub enum TicketError {
    /// Malformed input (empty subject or message).
    Validation(String),
    /// Ticket not found.
    NotFound(String),
    /// The state machine rejects the requested move.
    InvalidTransition {
        ticket_id: String,
        from: String,
        to: String,
    },
    /// Database error.
    Database(String),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            TicketError::NotFound(id) => write!(f, "Ticket not found: {}", id),
            TicketError::InvalidTransition {
                ticket_id,
                from,
                to,
            } => write!(
                f,
                "Cannot move ticket {} from {} to {}",
                ticket_id, from, to
            ),
            TicketError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TicketError {}

/// Request to create a new ticket.
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    /// Applicant the thread belongs to.
    pub applicant_id: String,
    pub subject: String,
    /// First message of the thread.
    pub message: String,
    /// Optional help category.
    pub category: Option<String>,
    /// True for walk-in desk tickets.
    pub is_offline: bool,
}

/// Result of appending a message to a ticket.
#[derive(Debug, Clone)]
pub struct AppendedMessage {
    pub ticket: Ticket,
    pub message: TicketMessage,
    /// True when the append fired the reopen transition.
    pub reopened: bool,
}

/// Filter for querying tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Filter by status.
    pub status: Option<TicketStatus>,
    /// Filter by owning applicant.
    pub applicant_id: Option<String>,
    /// Filter by assigned operator.
    pub assigned_to: Option<String>,
    /// Filter by online/offline origin.
    pub is_offline: Option<bool>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            applicant_id: None,
            assigned_to: None,
            is_offline: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_applicant_id(mut self, applicant_id: impl Into<String>) -> Self {
        self.applicant_id = Some(applicant_id.into());
        self
    }

    pub fn with_assigned_to(mut self, operator_id: impl Into<String>) -> Self {
        self.assigned_to = Some(operator_id.into());
        self
    }

    pub fn with_is_offline(mut self, is_offline: bool) -> Self {
        self.is_offline = Some(is_offline);
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

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket with its first message.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// List tickets matching the filter.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Messages of a ticket in append order.
    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>, TicketError>;

    /// Append a message. A staff message on a closed ticket fires the
    /// reopen transition; nothing else changes status.
    fn add_message(
        &self,
        ticket_id: &str,
        sender_id: &str,
        sender_role: Role,
        body: &str,
    ) -> Result<AppendedMessage, TicketError>;

    /// Move a ticket to a new status, validated against the transition table.
    fn update_status(&self, id: &str, new_status: TicketStatus) -> Result<Ticket, TicketError>;

    /// Set the priority. Allowed at any time.
    fn set_priority(&self, id: &str, priority: TicketPriority) -> Result<Ticket, TicketError>;

    /// Assign or clear the handling operator. Setting an operator starts
    /// an open ticket; clearing leaves status untouched.
    fn assign(&self, id: &str, operator_id: Option<&str>) -> Result<Ticket, TicketError>;

    /// All non-closed tickets in insertion order, for the load balancer.
    fn list_balanceable(&self) -> Result<Vec<Ticket>, TicketError>;

    /// Permanently delete a ticket and its messages.
    fn delete(&self, id: &str) -> Result<Ticket, TicketError>;

    /// Delete every ticket owned by an applicant (admin cascade).
    /// Returns the number of tickets removed.
    fn delete_by_applicant(&self, applicant_id: &str) -> Result<u32, TicketError>;
}
