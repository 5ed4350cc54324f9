//! Core help-ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Current status of a help ticket.
///
/// State machine flow:
/// ```text
/// open -> in_progress -> closed
///              ^------------'   (staff reply reopens)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    /// Returns the status as a string (for storage and filtering).
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }

    /// The named transition that moves this status to `target`, if that
    /// edge exists. Every legal move is enumerated here; there are no
    /// implicit status changes anywhere else.
    pub fn transition_to(self, target: TicketStatus) -> Option<TicketTransition> {
        match (self, target) {
            (TicketStatus::Open, TicketStatus::InProgress) => Some(TicketTransition::Start),
            (TicketStatus::InProgress, TicketStatus::Closed) => Some(TicketTransition::Close),
            (TicketStatus::Closed, TicketStatus::InProgress) => {
                Some(TicketTransition::ReopenOnStaffReply)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named transitions of the ticket state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketTransition {
    /// `open -> in_progress`: triage started (status update or operator
    /// assignment).
    Start,
    /// `in_progress -> closed`: staff resolved the ticket.
    Close,
    /// `closed -> in_progress`: a staff message landed on a closed ticket.
    ReopenOnStaffReply,
}

impl TicketTransition {
    /// Apply the transition. Returns `None` when the current status does
    /// not permit it.
    pub fn apply(self, current: TicketStatus) -> Option<TicketStatus> {
        match (self, current) {
            (TicketTransition::Start, TicketStatus::Open) => Some(TicketStatus::InProgress),
            (TicketTransition::Close, TicketStatus::InProgress) => Some(TicketStatus::Closed),
            (TicketTransition::ReopenOnStaffReply, TicketStatus::Closed) => {
                Some(TicketStatus::InProgress)
            }
            _ => None,
        }
    }
}

/// Ticket priority. Orthogonal to status: staff can change it at any time
/// and it never blocks a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TicketPriority::Low),
            "medium" => Some(TicketPriority::Medium),
            "high" => Some(TicketPriority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A help request thread between an applicant and staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier (UUID).
    pub id: String,

    /// Applicant who owns the thread.
    pub applicant_id: String,

    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,

    /// Operator currently handling the ticket, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// Optional help category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// True for tickets raised at the walk-in desk.
    #[serde(default)]
    pub is_offline: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message in a ticket thread. Append-only, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: String,
    pub sender_id: String,
    pub sender_role: Role,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_edges() {
        assert_eq!(
            TicketStatus::Open.transition_to(TicketStatus::InProgress),
            Some(TicketTransition::Start)
        );
        assert_eq!(
            TicketStatus::InProgress.transition_to(TicketStatus::Closed),
            Some(TicketTransition::Close)
        );
        assert_eq!(
            TicketStatus::Closed.transition_to(TicketStatus::InProgress),
            Some(TicketTransition::ReopenOnStaffReply)
        );
    }

    #[test]
    fn test_transition_table_rejects_everything_else() {
        assert_eq!(TicketStatus::Open.transition_to(TicketStatus::Closed), None);
        assert_eq!(TicketStatus::Closed.transition_to(TicketStatus::Open), None);
        assert_eq!(
            TicketStatus::InProgress.transition_to(TicketStatus::Open),
            None
        );
        // Self-transitions are not edges.
        assert_eq!(TicketStatus::Open.transition_to(TicketStatus::Open), None);
        assert_eq!(
            TicketStatus::Closed.transition_to(TicketStatus::Closed),
            None
        );
    }

    #[test]
    fn test_transition_apply() {
        assert_eq!(
            TicketTransition::Start.apply(TicketStatus::Open),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(TicketTransition::Start.apply(TicketStatus::Closed), None);
        assert_eq!(
            TicketTransition::ReopenOnStaffReply.apply(TicketStatus::Closed),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(
            TicketTransition::ReopenOnStaffReply.apply(TicketStatus::Open),
            None
        );
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Closed,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("bogus"), None);
    }

    #[test]
    fn test_priority_default_is_low() {
        assert_eq!(TicketPriority::default(), TicketPriority::Low);
    }

    #[test]
    fn test_priority_parse_roundtrip() {
        for priority in [
            TicketPriority::Low,
            TicketPriority::Medium,
            TicketPriority::High,
        ] {
            assert_eq!(TicketPriority::parse(priority.as_str()), Some(priority));
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let status: TicketStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(status, TicketStatus::Closed);
    }
}
