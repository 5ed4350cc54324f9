//! Walk-in queue data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current status of a walk-in queue ticket.
///
/// State machine flow:
/// ```text
/// waiting -> called -> serving -> completed
///               |         |
///               v         v
///             skipped   skipped
/// ```
///
/// `completed` and `skipped` are terminal; there is no undo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Called,
    Serving,
    Completed,
    Skipped,
}

impl QueueStatus {
    /// Returns the status as a string (for storage and filtering).
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::Called => "called",
            QueueStatus::Serving => "serving",
            QueueStatus::Completed => "completed",
            QueueStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(QueueStatus::Waiting),
            "called" => Some(QueueStatus::Called),
            "serving" => Some(QueueStatus::Serving),
            "completed" => Some(QueueStatus::Completed),
            "skipped" => Some(QueueStatus::Skipped),
            _ => None,
        }
    }

    /// Terminal states cannot transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Skipped)
    }

    /// Returns true while the ticket occupies a counter.
    pub fn is_at_counter(&self) -> bool {
        matches!(self, QueueStatus::Called | QueueStatus::Serving)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A walk-in service request tracked through the counter lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueTicket {
    /// Unique identifier (UUID).
    pub id: String,

    pub applicant_id: String,

    /// Position number shown on the display. Monotonic, scoped to the
    /// calendar day (UTC).
    pub queue_number: u32,

    /// Help category picked at the kiosk.
    pub category_id: String,

    pub status: QueueStatus,

    /// Counter serving the ticket, set on call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_id: Option<String>,

    /// Operator who called the ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,

    /// When the ticket was called to a counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served_at: Option<DateTime<Utc>>,

    /// When the ticket reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!QueueStatus::Waiting.is_terminal());
        assert!(!QueueStatus::Called.is_terminal());
        assert!(!QueueStatus::Serving.is_terminal());
        assert!(QueueStatus::Completed.is_terminal());
        assert!(QueueStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_is_at_counter() {
        assert!(!QueueStatus::Waiting.is_at_counter());
        assert!(QueueStatus::Called.is_at_counter());
        assert!(QueueStatus::Serving.is_at_counter());
        assert!(!QueueStatus::Completed.is_at_counter());
        assert!(!QueueStatus::Skipped.is_at_counter());
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            QueueStatus::Waiting,
            QueueStatus::Called,
            QueueStatus::Serving,
            QueueStatus::Completed,
            QueueStatus::Skipped,
        ] {
            assert_eq!(QueueStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QueueStatus::parse("bogus"), None);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&QueueStatus::Serving).unwrap(),
            "\"serving\""
        );
        let status: QueueStatus = serde_json::from_str("\"skipped\"").unwrap();
        assert_eq!(status, QueueStatus::Skipped);
    }
}
