use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Portal roles.
///
/// `Applicant` is the self-service role; the rest are staff. `Helpdesk`
/// handles the online ticket desk, `HelpdeskOffline` the walk-in counter
/// queue, `Content` the announcement board. `Admin` can do everything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Admin,
    Helpdesk,
    HelpdeskOffline,
    Content,
}

impl Role {
    /// Returns true for any non-applicant role.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Applicant)
    }

    /// Returns the role as a string (for logging and audit records).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Admin => "admin",
            Role::Helpdesk => "helpdesk",
            Role::HelpdeskOffline => "helpdesk_offline",
            Role::Content => "content",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applicant" => Ok(Role::Applicant),
            "admin" => Ok(Role::Admin),
            "helpdesk" => Ok(Role::Helpdesk),
            "helpdesk_offline" => Ok(Role::HelpdeskOffline),
            "content" => Ok(Role::Content),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub method: String,
}

impl Identity {
    /// Anonymous identity used by the `none` auth method.
    /// Carries the admin role so a keyless development setup can reach
    /// every endpoint.
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            role: Role::Admin,
            method: "none".to_string(),
        }
    }
}
