//! Helpdesk storage trait and request types.

use thiserror::Error;

use super::{Counter, Operator};

/// Error type for helpdesk staffing operations.
#[derive(Debug, Error)]
pub enum HelpdeskError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Request to register an operator.
#[derive(Debug, Clone)]
pub struct CreateOperatorRequest {
    pub user_id: String,
    pub display_name: String,
    /// Walk-in counter duty vs. online ticket desk.
    pub is_offline: bool,
}

impl CreateOperatorRequest {
    pub fn validate(&self) -> Result<(), HelpdeskError> {
        if self.user_id.trim().is_empty() {
            return Err(HelpdeskError::Validation(
                "user_id cannot be empty".to_string(),
            ));
        }
        if self.display_name.trim().is_empty() {
            return Err(HelpdeskError::Validation(
                "display_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update for an operator. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateOperatorRequest {
    pub display_name: Option<String>,
    pub is_offline: Option<bool>,
    pub is_active: Option<bool>,
}

/// Filter for listing operators.
#[derive(Debug, Clone, Default)]
pub struct OperatorFilter {
    /// Only active operators.
    pub active_only: bool,
    /// Filter by duty type.
    pub is_offline: Option<bool>,
}

impl OperatorFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active operators on the online ticket desk; the balancer's pool.
    pub fn active_online() -> Self {
        Self {
            active_only: true,
            is_offline: Some(false),
        }
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn with_is_offline(mut self, is_offline: bool) -> Self {
        self.is_offline = Some(is_offline);
        self
    }
}

/// Partial update for a counter. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCounterRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Trait for helpdesk staffing storage backends.
pub trait HelpdeskStore: Send + Sync {
    /// Register a new operator. Duplicate user ids are rejected.
    fn create_operator(&self, request: CreateOperatorRequest) -> Result<Operator, HelpdeskError>;

    /// Get an operator by user id.
    fn get_operator(&self, user_id: &str) -> Result<Option<Operator>, HelpdeskError>;

    /// List operators in registration order.
    fn list_operators(&self, filter: &OperatorFilter) -> Result<Vec<Operator>, HelpdeskError>;

    /// Update an operator. Deactivating one releases any counter it holds.
    fn update_operator(
        &self,
        user_id: &str,
        request: UpdateOperatorRequest,
    ) -> Result<Operator, HelpdeskError>;

    /// Create a new counter.
    fn create_counter(&self, name: &str) -> Result<Counter, HelpdeskError>;

    /// Get a counter by ID.
    fn get_counter(&self, id: &str) -> Result<Option<Counter>, HelpdeskError>;

    /// List all counters.
    fn list_counters(&self) -> Result<Vec<Counter>, HelpdeskError>;

    /// Update a counter's name or active flag.
    fn update_counter(
        &self,
        id: &str,
        request: UpdateCounterRequest,
    ) -> Result<Counter, HelpdeskError>;

    /// Delete a counter.
    fn delete_counter(&self, id: &str) -> Result<Counter, HelpdeskError>;

    /// Attach an operator to the counter (or detach with `None`).
    /// One operator holds at most one counter: attaching releases any
    /// previous binding in the same transaction. The operator must be
    /// active and on walk-in duty.
    fn attach_operator(
        &self,
        counter_id: &str,
        operator_id: Option<&str>,
    ) -> Result<Counter, HelpdeskError>;
}
