pub mod announcements;
pub mod applicants;
pub mod audit;
pub mod groups;
pub mod handlers;
pub mod helpdesk;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod tickets;
pub mod ws;

pub use routes::create_router;
pub use ws::WsBroadcaster;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use prereg_core::{Identity, Role};

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Reject non-staff identities.
pub(crate) fn require_staff(identity: &Identity) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if identity.role.is_staff() {
        Ok(())
    } else {
        Err(error_response(
            StatusCode::FORBIDDEN,
            "staff role required",
        ))
    }
}

/// Reject identities outside the given role set (admin always passes).
pub(crate) fn require_role(
    identity: &Identity,
    allowed: &[Role],
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if identity.role == Role::Admin || allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(error_response(
            StatusCode::FORBIDDEN,
            format!("role {} is not allowed to do this", identity.role),
        ))
    }
}
