use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Registration lifecycle
    ApplicantRegistered {
        applicant_id: String,
        name: String,
        email: String,
    },
    ApplicantDeleted {
        applicant_id: String,
        deleted_by: String,
        tickets_removed: u32,
    },
    GroupAssigned {
        applicant_id: String,
        group_id: String,
        group_name: String,
    },
    JoinConfirmed {
        applicant_id: String,
    },

    // Group administration
    GroupCreated {
        group_id: String,
        name: String,
        capacity: u32,
        created_by: String,
    },
    GroupUpdated {
        group_id: String,
        updated_by: String,
    },
    GroupDeleted {
        group_id: String,
        deleted_by: String,
    },

    // Help ticket lifecycle
    TicketCreated {
        ticket_id: String,
        applicant_id: String,
        subject: String,
        is_offline: bool,
    },
    TicketStatusChanged {
        ticket_id: String,
        from_status: String,
        to_status: String,
        changed_by: String,
    },
    TicketPriorityChanged {
        ticket_id: String,
        priority: String,
        changed_by: String,
    },
    TicketAssigned {
        ticket_id: String,
        operator_id: Option<String>,
        assigned_by: String,
    },
    TicketMessageAdded {
        ticket_id: String,
        sender_id: String,
        sender_role: String,
        /// True when the message fired the reopen transition.
        reopened: bool,
    },
    TicketDeleted {
        ticket_id: String,
        deleted_by: String,
    },
    TicketsBalanced {
        operators: u32,
        tickets: u32,
        balanced_by: String,
    },

    // Walk-in queue lifecycle
    QueueTicketCreated {
        ticket_id: String,
        applicant_id: String,
        queue_number: u32,
    },
    QueueCalled {
        ticket_id: String,
        queue_number: u32,
        counter_id: String,
        operator_id: String,
    },
    QueueRecalled {
        ticket_id: String,
        counter_id: Option<String>,
    },
    QueueServing {
        ticket_id: String,
    },
    QueueCompleted {
        ticket_id: String,
    },
    QueueSkipped {
        ticket_id: String,
        skipped_by: String,
    },

    // Content board
    AnnouncementPublished {
        announcement_id: String,
        title: String,
        published_by: String,
    },
}

impl AuditEvent {
    /// Snake-case discriminant used for indexed queries.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ServiceStarted { .. } => "service_started",
            AuditEvent::ServiceStopped { .. } => "service_stopped",
            AuditEvent::ApplicantRegistered { .. } => "applicant_registered",
            AuditEvent::ApplicantDeleted { .. } => "applicant_deleted",
            AuditEvent::GroupAssigned { .. } => "group_assigned",
            AuditEvent::JoinConfirmed { .. } => "join_confirmed",
            AuditEvent::GroupCreated { .. } => "group_created",
            AuditEvent::GroupUpdated { .. } => "group_updated",
            AuditEvent::GroupDeleted { .. } => "group_deleted",
            AuditEvent::TicketCreated { .. } => "ticket_created",
            AuditEvent::TicketStatusChanged { .. } => "ticket_status_changed",
            AuditEvent::TicketPriorityChanged { .. } => "ticket_priority_changed",
            AuditEvent::TicketAssigned { .. } => "ticket_assigned",
            AuditEvent::TicketMessageAdded { .. } => "ticket_message_added",
            AuditEvent::TicketDeleted { .. } => "ticket_deleted",
            AuditEvent::TicketsBalanced { .. } => "tickets_balanced",
            AuditEvent::QueueTicketCreated { .. } => "queue_ticket_created",
            AuditEvent::QueueCalled { .. } => "queue_called",
            AuditEvent::QueueRecalled { .. } => "queue_recalled",
            AuditEvent::QueueServing { .. } => "queue_serving",
            AuditEvent::QueueCompleted { .. } => "queue_completed",
            AuditEvent::QueueSkipped { .. } => "queue_skipped",
            AuditEvent::AnnouncementPublished { .. } => "announcement_published",
        }
    }

    /// Primary entity this event is about (applicant, group, ticket, ...).
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            AuditEvent::ServiceStarted { .. } | AuditEvent::ServiceStopped { .. } => None,
            AuditEvent::ApplicantRegistered { applicant_id, .. }
            | AuditEvent::ApplicantDeleted { applicant_id, .. }
            | AuditEvent::GroupAssigned { applicant_id, .. }
            | AuditEvent::JoinConfirmed { applicant_id } => Some(applicant_id),
            AuditEvent::GroupCreated { group_id, .. }
            | AuditEvent::GroupUpdated { group_id, .. }
            | AuditEvent::GroupDeleted { group_id, .. } => Some(group_id),
            AuditEvent::TicketCreated { ticket_id, .. }
            | AuditEvent::TicketStatusChanged { ticket_id, .. }
            | AuditEvent::TicketPriorityChanged { ticket_id, .. }
            | AuditEvent::TicketAssigned { ticket_id, .. }
            | AuditEvent::TicketMessageAdded { ticket_id, .. }
            | AuditEvent::TicketDeleted { ticket_id, .. }
            | AuditEvent::QueueTicketCreated { ticket_id, .. }
            | AuditEvent::QueueCalled { ticket_id, .. }
            | AuditEvent::QueueRecalled { ticket_id, .. }
            | AuditEvent::QueueServing { ticket_id }
            | AuditEvent::QueueCompleted { ticket_id }
            | AuditEvent::QueueSkipped { ticket_id, .. } => Some(ticket_id),
            AuditEvent::TicketsBalanced { .. } => None,
            AuditEvent::AnnouncementPublished {
                announcement_id, ..
            } => Some(announcement_id),
        }
    }

    /// User who triggered the event, when one is recorded.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuditEvent::ApplicantDeleted { deleted_by, .. } => Some(deleted_by),
            AuditEvent::GroupCreated { created_by, .. } => Some(created_by),
            AuditEvent::GroupUpdated { updated_by, .. } => Some(updated_by),
            AuditEvent::GroupDeleted { deleted_by, .. } => Some(deleted_by),
            AuditEvent::TicketStatusChanged { changed_by, .. }
            | AuditEvent::TicketPriorityChanged { changed_by, .. } => Some(changed_by),
            AuditEvent::TicketAssigned { assigned_by, .. } => Some(assigned_by),
            AuditEvent::TicketMessageAdded { sender_id, .. } => Some(sender_id),
            AuditEvent::TicketDeleted { deleted_by, .. } => Some(deleted_by),
            AuditEvent::TicketsBalanced { balanced_by, .. } => Some(balanced_by),
            AuditEvent::QueueSkipped { skipped_by, .. } => Some(skipped_by),
            AuditEvent::AnnouncementPublished { published_by, .. } => Some(published_by),
            _ => None,
        }
    }
}

/// A stored audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub subject_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_strings() {
        let event = AuditEvent::ApplicantRegistered {
            applicant_id: "a-1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
        };
        assert_eq!(event.event_type(), "applicant_registered");

        let event = AuditEvent::QueueCalled {
            ticket_id: "q-1".to_string(),
            queue_number: 7,
            counter_id: "c-1".to_string(),
            operator_id: "op-1".to_string(),
        };
        assert_eq!(event.event_type(), "queue_called");
    }

    #[test]
    fn test_subject_id_extraction() {
        let event = AuditEvent::GroupAssigned {
            applicant_id: "a-1".to_string(),
            group_id: "g-1".to_string(),
            group_name: "Group A".to_string(),
        };
        assert_eq!(event.subject_id(), Some("a-1"));

        let event = AuditEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc".to_string(),
        };
        assert_eq!(event.subject_id(), None);
    }

    #[test]
    fn test_user_id_extraction() {
        let event = AuditEvent::TicketStatusChanged {
            ticket_id: "t-1".to_string(),
            from_status: "open".to_string(),
            to_status: "in_progress".to_string(),
            changed_by: "desk-1".to_string(),
        };
        assert_eq!(event.user_id(), Some("desk-1"));

        let event = AuditEvent::JoinConfirmed {
            applicant_id: "a-1".to_string(),
        };
        assert_eq!(event.user_id(), None);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = AuditEvent::TicketMessageAdded {
            ticket_id: "t-1".to_string(),
            sender_id: "desk-1".to_string(),
            sender_role: "helpdesk".to_string(),
            reopened: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ticket_message_added\""));

        let deserialized: AuditEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            AuditEvent::TicketMessageAdded { reopened: true, .. }
        ));
    }
}
