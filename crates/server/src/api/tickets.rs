//! Help ticket API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{
    AuditEvent, BalanceError, BalanceReport, CreateTicketRequest, Role, Ticket, TicketError,
    TicketFilter, TicketMessage, TicketPriority, TicketStatus,
};

use crate::state::AppState;

use super::middleware::AuthIdentity;
use super::{error_response, require_role, require_staff, ErrorResponse};

/// Maximum allowed limit for ticket queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for ticket queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    /// Required for staff creating a ticket on an applicant's behalf;
    /// ignored for applicant callers (their own id is used).
    pub applicant_id: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: Option<String>,
    #[serde(default)]
    pub is_offline: bool,
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    /// Filter by status
    pub status: Option<TicketStatus>,
    /// Filter by owning applicant
    pub applicant_id: Option<String>,
    /// Filter by assigned operator
    pub assigned_to: Option<String>,
    /// Maximum number of tickets to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Request body for appending a message
#[derive(Debug, Deserialize)]
pub struct AddMessageBody {
    pub message: String,
}

/// Request body for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: TicketStatus,
}

/// Request body for a priority change
#[derive(Debug, Deserialize)]
pub struct UpdatePriorityBody {
    pub priority: TicketPriority,
}

/// Request body for assignment; `operator_id: null` clears it
#[derive(Debug, Deserialize)]
pub struct AssignTicketBody {
    pub operator_id: Option<String>,
}

/// Response for ticket operations
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub applicant_id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_offline: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            applicant_id: ticket.applicant_id,
            subject: ticket.subject,
            status: ticket.status,
            priority: ticket.priority,
            assigned_to: ticket.assigned_to,
            category: ticket.category,
            is_offline: ticket.is_offline,
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

/// Response for a single message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub ticket_id: String,
    pub sender_id: String,
    pub sender_role: Role,
    pub body: String,
    pub created_at: String,
}

impl From<TicketMessage> for MessageResponse {
    fn from(message: TicketMessage) -> Self {
        Self {
            id: message.id,
            ticket_id: message.ticket_id,
            sender_id: message.sender_id,
            sender_role: message.sender_role,
            body: message.body,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for listing messages
#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

/// Response for appending a message
#[derive(Debug, Serialize)]
pub struct AddMessageResponse {
    pub ticket: TicketResponse,
    pub message: MessageResponse,
    pub reopened: bool,
}

// ============================================================================
// Handlers
// ============================================================================

fn map_ticket_error(e: TicketError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        TicketError::Validation(_) => StatusCode::BAD_REQUEST,
        TicketError::NotFound(_) => StatusCode::NOT_FOUND,
        TicketError::InvalidTransition { .. } => StatusCode::CONFLICT,
        TicketError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// Applicants only see their own threads.
fn check_ticket_access(
    identity: &prereg_core::Identity,
    ticket: &Ticket,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if identity.role == Role::Applicant && identity.user_id != ticket.applicant_id {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "applicants can only access their own tickets",
        ));
    }
    Ok(())
}

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<TicketResponse>), (StatusCode, Json<ErrorResponse>)> {
    let applicant_id = if identity.role == Role::Applicant {
        identity.user_id.clone()
    } else {
        match body.applicant_id {
            Some(id) => id,
            None => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "applicant_id is required",
                ))
            }
        }
    };

    let request = CreateTicketRequest {
        applicant_id,
        subject: body.subject,
        message: body.message,
        category: body.category,
        is_offline: body.is_offline,
    };

    let ticket = state
        .ticket_store()
        .create(request)
        .map_err(map_ticket_error)?;

    state.audit().try_emit(AuditEvent::TicketCreated {
        ticket_id: ticket.id.clone(),
        applicant_id: ticket.applicant_id.clone(),
        subject: ticket.subject.clone(),
        is_offline: ticket.is_offline,
    });
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status.as_str());

    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.ticket_store().get(&id) {
        Ok(Some(ticket)) => {
            check_ticket_access(&identity, &ticket)?;
            Ok(Json(TicketResponse::from(ticket)))
        }
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Ticket not found: {}", id),
        )),
        Err(e) => Err(map_ticket_error(e)),
    }
}

/// List tickets with optional filters
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<ListTicketsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = TicketFilter::new().with_limit(limit).with_offset(offset);

    if let Some(status) = params.status {
        filter = filter.with_status(status);
    }
    if let Some(ref assigned_to) = params.assigned_to {
        filter = filter.with_assigned_to(assigned_to);
    }

    // Applicants are pinned to their own tickets regardless of filters.
    if identity.role == Role::Applicant {
        filter = filter.with_applicant_id(&identity.user_id);
    } else if let Some(ref applicant_id) = params.applicant_id {
        filter = filter.with_applicant_id(applicant_id);
    }

    let tickets = state
        .ticket_store()
        .list(&filter)
        .map_err(map_ticket_error)?;

    let count_filter = TicketFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter.clone()
    };
    let total = state
        .ticket_store()
        .count(&count_filter)
        .map_err(map_ticket_error)?;

    Ok(Json(ListTicketsResponse {
        tickets: tickets.into_iter().map(TicketResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// List a ticket's messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<ListMessagesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let ticket = match state.ticket_store().get(&id) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Ticket not found: {}", id),
            ))
        }
        Err(e) => return Err(map_ticket_error(e)),
    };
    check_ticket_access(&identity, &ticket)?;

    let messages = state.ticket_store().messages(&id).map_err(map_ticket_error)?;

    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

/// Append a message to a ticket
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<AddMessageBody>,
) -> Result<Json<AddMessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let ticket = match state.ticket_store().get(&id) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Ticket not found: {}", id),
            ))
        }
        Err(e) => return Err(map_ticket_error(e)),
    };
    check_ticket_access(&identity, &ticket)?;

    let appended = state
        .ticket_store()
        .add_message(&id, &identity.user_id, identity.role, &body.message)
        .map_err(map_ticket_error)?;

    state.audit().try_emit(AuditEvent::TicketMessageAdded {
        ticket_id: id.clone(),
        sender_id: identity.user_id,
        sender_role: identity.role.as_str().to_string(),
        reopened: appended.reopened,
    });
    state
        .ws_broadcaster()
        .ticket_updated(&id, appended.ticket.status.as_str());

    Ok(Json(AddMessageResponse {
        ticket: TicketResponse::from(appended.ticket),
        message: MessageResponse::from(appended.message),
        reopened: appended.reopened,
    }))
}

/// Change a ticket's status (staff)
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<TicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let previous = match state.ticket_store().get(&id) {
        Ok(Some(ticket)) => ticket.status,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Ticket not found: {}", id),
            ))
        }
        Err(e) => return Err(map_ticket_error(e)),
    };

    let ticket = state
        .ticket_store()
        .update_status(&id, body.status)
        .map_err(map_ticket_error)?;

    state.audit().try_emit(AuditEvent::TicketStatusChanged {
        ticket_id: ticket.id.clone(),
        from_status: previous.as_str().to_string(),
        to_status: ticket.status.as_str().to_string(),
        changed_by: identity.user_id,
    });
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(TicketResponse::from(ticket)))
}

/// Change a ticket's priority (staff)
pub async fn update_priority(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<UpdatePriorityBody>,
) -> Result<Json<TicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let ticket = state
        .ticket_store()
        .set_priority(&id, body.priority)
        .map_err(map_ticket_error)?;

    state.audit().try_emit(AuditEvent::TicketPriorityChanged {
        ticket_id: ticket.id.clone(),
        priority: ticket.priority.as_str().to_string(),
        changed_by: identity.user_id,
    });
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(TicketResponse::from(ticket)))
}

/// Assign or clear a ticket's operator (staff)
pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<AssignTicketBody>,
) -> Result<Json<TicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let ticket = state
        .ticket_store()
        .assign(&id, body.operator_id.as_deref())
        .map_err(map_ticket_error)?;

    state.audit().try_emit(AuditEvent::TicketAssigned {
        ticket_id: ticket.id.clone(),
        operator_id: ticket.assigned_to.clone(),
        assigned_by: identity.user_id,
    });
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(TicketResponse::from(ticket)))
}

/// Redistribute open tickets across active online operators (staff)
pub async fn balance_tickets(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<BalanceReport>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[Role::Helpdesk])?;

    match state.balancer().balance(&identity.user_id) {
        Ok(report) => Ok(Json(report)),
        Err(BalanceError::NoOperators) => Err(error_response(
            StatusCode::BAD_REQUEST,
            BalanceError::NoOperators.to_string(),
        )),
        Err(BalanceError::Ticket(e)) => Err(map_ticket_error(e)),
        Err(BalanceError::Helpdesk(e)) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// Permanently delete a ticket (admin)
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let ticket = state.ticket_store().delete(&id).map_err(map_ticket_error)?;

    state.audit().try_emit(AuditEvent::TicketDeleted {
        ticket_id: ticket.id.clone(),
        deleted_by: identity.user_id,
    });
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(TicketResponse::from(ticket)))
}
