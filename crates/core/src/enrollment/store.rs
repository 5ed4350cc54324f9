//! Enrollment storage trait and request types.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

use super::{Applicant, Group};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,19}$").unwrap());

/// Error type for enrollment operations.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// Malformed input (empty name, bad email, ...).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced applicant or group missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Every group is at capacity.
    #[error("No group has spare capacity")]
    CapacityExceeded,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to register a new applicant.
#[derive(Debug, Clone)]
pub struct RegisterApplicantRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl RegisterApplicantRequest {
    /// Validate the submitted form fields.
    pub fn validate(&self) -> Result<(), EnrollmentError> {
        if self.name.trim().is_empty() {
            return Err(EnrollmentError::Validation("name cannot be empty".to_string()));
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(EnrollmentError::Validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        if !PHONE_RE.is_match(self.phone.trim()) {
            return Err(EnrollmentError::Validation(format!(
                "invalid phone number: {}",
                self.phone
            )));
        }
        Ok(())
    }
}

/// Request to create a group.
#[derive(Debug, Clone)]
pub struct CreateGroupRequest {
    pub name: String,
    pub capacity: u32,
    pub invite_link: String,
}

impl CreateGroupRequest {
    pub fn validate(&self) -> Result<(), EnrollmentError> {
        if self.name.trim().is_empty() {
            return Err(EnrollmentError::Validation("group name cannot be empty".to_string()));
        }
        if self.capacity == 0 {
            return Err(EnrollmentError::Validation(
                "group capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update for a group. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub invite_link: Option<String>,
}

/// Filter for querying applicants.
#[derive(Debug, Clone, Default)]
pub struct ApplicantFilter {
    /// Filter on whether a group was assigned.
    pub assigned: Option<bool>,
    /// Filter on join confirmation.
    pub join_confirmed: Option<bool>,
    /// Filter by assigned group.
    pub group_id: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl ApplicantFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            assigned: None,
            join_confirmed: None,
            group_id: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_assigned(mut self, assigned: bool) -> Self {
        self.assigned = Some(assigned);
        self
    }

    pub fn with_join_confirmed(mut self, confirmed: bool) -> Self {
        self.join_confirmed = Some(confirmed);
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
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

/// Trait for enrollment storage backends.
///
/// Applicants and groups live in one store because assignment mutates
/// both atomically.
pub trait EnrollmentStore: Send + Sync {
    /// Register a new applicant.
    fn register(&self, request: RegisterApplicantRequest) -> Result<Applicant, EnrollmentError>;

    /// Get an applicant by ID.
    fn get_applicant(&self, id: &str) -> Result<Option<Applicant>, EnrollmentError>;

    /// List applicants matching the filter.
    fn list_applicants(&self, filter: &ApplicantFilter) -> Result<Vec<Applicant>, EnrollmentError>;

    /// Count applicants matching the filter.
    fn count_applicants(&self, filter: &ApplicantFilter) -> Result<i64, EnrollmentError>;

    /// Idempotently mark the applicant as having joined their group.
    fn confirm_join(&self, id: &str) -> Result<Applicant, EnrollmentError>;

    /// Permanently delete an applicant. Returns the deleted row.
    /// Ticket cleanup is the caller's responsibility.
    fn delete_applicant(&self, id: &str) -> Result<Applicant, EnrollmentError>;

    /// Create a new group.
    fn create_group(&self, request: CreateGroupRequest) -> Result<Group, EnrollmentError>;

    /// Get a group by ID.
    fn get_group(&self, id: &str) -> Result<Option<Group>, EnrollmentError>;

    /// List all groups in assignment scan order (creation time, then name).
    fn list_groups(&self) -> Result<Vec<Group>, EnrollmentError>;

    /// Update a group. Shrinking capacity below the member count is rejected.
    fn update_group(&self, id: &str, request: UpdateGroupRequest) -> Result<Group, EnrollmentError>;

    /// Delete an empty group. Groups with members are rejected.
    fn delete_group(&self, id: &str) -> Result<Group, EnrollmentError>;

    /// Atomically assign the applicant to the first group with spare
    /// capacity: increments that group's member count and stamps the
    /// applicant's `assigned_group_id` in a single transaction.
    fn assign_first_available(
        &self,
        applicant_id: &str,
    ) -> Result<(Applicant, Group), EnrollmentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterApplicantRequest {
        RegisterApplicantRequest {
            name: "Ana Lima".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+55 11 91234-5678".to_string(),
        }
    }

    #[test]
    fn test_register_request_valid() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_register_request_empty_name() {
        let mut request = valid_request();
        request.name = "  ".to_string();
        assert!(matches!(
            request.validate(),
            Err(EnrollmentError::Validation(_))
        ));
    }

    #[test]
    fn test_register_request_bad_email() {
        let mut request = valid_request();
        request.email = "not-an-email".to_string();
        assert!(matches!(
            request.validate(),
            Err(EnrollmentError::Validation(_))
        ));
    }

    #[test]
    fn test_register_request_bad_phone() {
        let mut request = valid_request();
        request.phone = "abc".to_string();
        assert!(matches!(
            request.validate(),
            Err(EnrollmentError::Validation(_))
        ));
    }

    #[test]
    fn test_create_group_request_zero_capacity() {
        let request = CreateGroupRequest {
            name: "Group A".to_string(),
            capacity: 0,
            invite_link: String::new(),
        };
        assert!(matches!(
            request.validate(),
            Err(EnrollmentError::Validation(_))
        ));
    }

    #[test]
    fn test_applicant_filter_builder() {
        let filter = ApplicantFilter::new()
            .with_assigned(true)
            .with_join_confirmed(false)
            .with_limit(10)
            .with_offset(5);
        assert_eq!(filter.assigned, Some(true));
        assert_eq!(filter.join_confirmed, Some(false));
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 5);
    }
}
