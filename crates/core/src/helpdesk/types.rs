//! Helpdesk staffing data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A staff member on ticket or counter duty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operator {
    /// User id (matches the auth identity).
    pub user_id: String,

    pub display_name: String,

    /// True for walk-in counter duty, false for the online ticket desk.
    pub is_offline: bool,

    /// Inactive operators receive no tickets and cannot staff counters.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A physical or logical service point staffed by at most one operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Counter {
    /// Unique identifier (UUID).
    pub id: String,

    pub name: String,
    pub is_active: bool,

    /// Operator currently attached, if any. One operator can hold at most
    /// one counter; attaching elsewhere releases the previous binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_serialization() {
        let operator = Operator {
            user_id: "op-1".to_string(),
            display_name: "Desk One".to_string(),
            is_offline: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&operator).unwrap();
        let deserialized: Operator = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, operator);
    }

    #[test]
    fn test_counter_serialization_skips_empty_operator() {
        let counter = Counter {
            id: "c-1".to_string(),
            name: "Counter 1".to_string(),
            is_active: true,
            operator_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&counter).unwrap();
        assert!(!json.contains("operator_id"));
    }
}
