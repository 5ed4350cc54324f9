//! Walk-in queue API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{
    AuditEvent, CreateQueueTicketRequest, QueueError, QueueFilter, QueueStatus, QueueTicket, Role,
};

use crate::state::AppState;

use super::middleware::AuthIdentity;
use super::{error_response, require_role, ErrorResponse};

/// Maximum allowed limit for queue queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for queue queries
const DEFAULT_LIMIT: i64 = 100;

/// Staff roles allowed to drive the counter flow.
const COUNTER_ROLES: &[Role] = &[Role::HelpdeskOffline];

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for taking a queue number
#[derive(Debug, Deserialize)]
pub struct CreateQueueTicketBody {
    /// Required for staff (kiosk) callers; ignored for applicants.
    pub applicant_id: Option<String>,
    pub category_id: String,
}

/// Request body for calling the next ticket
#[derive(Debug, Deserialize)]
pub struct CallNextBody {
    pub counter_id: String,
}

/// Query parameters for listing queue tickets
#[derive(Debug, Deserialize)]
pub struct ListQueueParams {
    /// Filter by status
    pub status: Option<QueueStatus>,
    /// Filter by counter
    pub counter_id: Option<String>,
    /// Only today's tickets
    pub today: Option<bool>,
    /// Maximum number of tickets to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for queue ticket operations
#[derive(Debug, Serialize)]
pub struct QueueTicketResponse {
    pub id: String,
    pub applicant_id: String,
    pub queue_number: u32,
    pub category_id: String,
    pub status: QueueStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QueueTicket> for QueueTicketResponse {
    fn from(ticket: QueueTicket) -> Self {
        Self {
            id: ticket.id,
            applicant_id: ticket.applicant_id,
            queue_number: ticket.queue_number,
            category_id: ticket.category_id,
            status: ticket.status,
            counter_id: ticket.counter_id,
            operator_id: ticket.operator_id,
            served_at: ticket.served_at.map(|dt| dt.to_rfc3339()),
            completed_at: ticket.completed_at.map(|dt| dt.to_rfc3339()),
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing queue tickets
#[derive(Debug, Serialize)]
pub struct ListQueueResponse {
    pub tickets: Vec<QueueTicketResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Handlers
// ============================================================================

fn map_queue_error(e: QueueError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        QueueError::Validation(_) => StatusCode::BAD_REQUEST,
        QueueError::NotFound(_) => StatusCode::NOT_FOUND,
        QueueError::InvalidTransition(_) => StatusCode::CONFLICT,
        QueueError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// Take a queue number
pub async fn create_queue_ticket(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CreateQueueTicketBody>,
) -> Result<(StatusCode, Json<QueueTicketResponse>), (StatusCode, Json<ErrorResponse>)> {
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

    let request = CreateQueueTicketRequest {
        applicant_id,
        category_id: body.category_id,
    };

    let ticket = state.queue_store().create(request).map_err(map_queue_error)?;

    state.audit().try_emit(AuditEvent::QueueTicketCreated {
        ticket_id: ticket.id.clone(),
        applicant_id: ticket.applicant_id.clone(),
        queue_number: ticket.queue_number,
    });
    state
        .ws_broadcaster()
        .queue_updated(&ticket.id, ticket.status.as_str());

    Ok((StatusCode::CREATED, Json(QueueTicketResponse::from(ticket))))
}

/// List queue tickets
pub async fn list_queue_tickets(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(params): Query<ListQueueParams>,
) -> Result<Json<ListQueueResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = QueueFilter::new().with_limit(limit).with_offset(offset);

    if let Some(status) = params.status {
        filter = filter.with_status(status);
    }
    if let Some(ref counter_id) = params.counter_id {
        filter = filter.with_counter_id(counter_id);
    }
    if params.today.unwrap_or(false) {
        filter = filter.today_only();
    }

    // Applicants only see their own numbers.
    if identity.role == Role::Applicant {
        filter = filter.with_applicant_id(&identity.user_id);
    }

    let tickets = state.queue_store().list(&filter).map_err(map_queue_error)?;

    let count_filter = QueueFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter.clone()
    };
    let total = state
        .queue_store()
        .count(&count_filter)
        .map_err(map_queue_error)?;

    Ok(Json(ListQueueResponse {
        tickets: tickets.into_iter().map(QueueTicketResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Call the next waiting ticket to a counter (walk-in staff)
pub async fn call_next(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CallNextBody>,
) -> Result<Json<QueueTicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, COUNTER_ROLES)?;

    let counter = match state.helpdesk_store().get_counter(&body.counter_id) {
        Ok(Some(counter)) => counter,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Counter not found: {}", body.counter_id),
            ))
        }
        Err(e) => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ))
        }
    };

    if !counter.is_active {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("counter {} is not active", counter.name),
        ));
    }
    let operator_id = match counter.operator_id {
        Some(ref operator_id) => operator_id.clone(),
        None => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("counter {} has no operator attached", counter.name),
            ))
        }
    };

    let ticket = state
        .queue_store()
        .call_next(&counter.id, &operator_id)
        .map_err(map_queue_error)?;

    state.audit().try_emit(AuditEvent::QueueCalled {
        ticket_id: ticket.id.clone(),
        queue_number: ticket.queue_number,
        counter_id: counter.id.clone(),
        operator_id,
    });
    // One announcement per transition into called.
    state
        .ws_broadcaster()
        .queue_called(&ticket.id, ticket.queue_number, &counter.id, &counter.name);
    state
        .ws_broadcaster()
        .queue_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(QueueTicketResponse::from(ticket)))
}

/// Re-announce a called/serving ticket without changing its state
pub async fn recall(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<QueueTicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, COUNTER_ROLES)?;

    let ticket = state.queue_store().recall(&id).map_err(map_queue_error)?;

    state.audit().try_emit(AuditEvent::QueueRecalled {
        ticket_id: ticket.id.clone(),
        counter_id: ticket.counter_id.clone(),
    });

    // Re-trigger the announcement with the counter's display name.
    if let Some(ref counter_id) = ticket.counter_id {
        let counter_name = state
            .helpdesk_store()
            .get_counter(counter_id)
            .ok()
            .flatten()
            .map(|c| c.name)
            .unwrap_or_else(|| counter_id.clone());
        state
            .ws_broadcaster()
            .queue_called(&ticket.id, ticket.queue_number, counter_id, &counter_name);
    }

    Ok(Json(QueueTicketResponse::from(ticket)))
}

/// Start serving a called ticket
pub async fn start_serving(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<QueueTicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, COUNTER_ROLES)?;

    let ticket = state.queue_store().start_serving(&id).map_err(map_queue_error)?;

    state.audit().try_emit(AuditEvent::QueueServing {
        ticket_id: ticket.id.clone(),
    });
    state
        .ws_broadcaster()
        .queue_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(QueueTicketResponse::from(ticket)))
}

/// Complete a serving ticket
pub async fn complete(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<QueueTicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, COUNTER_ROLES)?;

    let ticket = state.queue_store().complete(&id).map_err(map_queue_error)?;

    state.audit().try_emit(AuditEvent::QueueCompleted {
        ticket_id: ticket.id.clone(),
    });
    state
        .ws_broadcaster()
        .queue_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(QueueTicketResponse::from(ticket)))
}

/// Skip a called or serving ticket
pub async fn skip(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<QueueTicketResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, COUNTER_ROLES)?;

    let ticket = state.queue_store().skip(&id).map_err(map_queue_error)?;

    state.audit().try_emit(AuditEvent::QueueSkipped {
        ticket_id: ticket.id.clone(),
        skipped_by: identity.user_id,
    });
    state
        .ws_broadcaster()
        .queue_updated(&ticket.id, ticket.status.as_str());

    Ok(Json(QueueTicketResponse::from(ticket)))
}
