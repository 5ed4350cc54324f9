//! Core enrollment data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An applicant registered through the portal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Applicant {
    /// Unique identifier (UUID).
    pub id: String,

    pub name: String,
    pub email: String,
    pub phone: String,

    /// Group this applicant was assigned to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_group_id: Option<String>,

    /// Whether the applicant confirmed joining their group.
    #[serde(default)]
    pub join_confirmed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Applicant {
    /// Returns true once the applicant has a group.
    pub fn is_assigned(&self) -> bool {
        self.assigned_group_id.is_some()
    }
}

/// A capacity-bounded communication group (WhatsApp group in practice).
///
/// Invariant: `0 <= member_count <= capacity`. The member count is only
/// ever incremented through the conditional assignment update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    /// Unique identifier (UUID).
    pub id: String,

    pub name: String,
    pub capacity: u32,
    pub member_count: u32,
    pub invite_link: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Returns true when no more applicants fit.
    pub fn is_full(&self) -> bool {
        self.member_count >= self.capacity
    }

    /// Remaining seats.
    pub fn spare_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.member_count)
    }
}
