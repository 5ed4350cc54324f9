//! Helpdesk staffing API handlers: operators and counters.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{
    Counter, CreateOperatorRequest, HelpdeskError, Operator, OperatorFilter,
    UpdateCounterRequest, UpdateOperatorRequest,
};

use crate::state::AppState;

use super::middleware::AuthIdentity;
use super::{error_response, require_role, require_staff, ErrorResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registering an operator
#[derive(Debug, Deserialize)]
pub struct CreateOperatorBody {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub is_offline: bool,
}

/// Request body for updating an operator
#[derive(Debug, Deserialize)]
pub struct UpdateOperatorBody {
    pub display_name: Option<String>,
    pub is_offline: Option<bool>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing operators
#[derive(Debug, Deserialize)]
pub struct ListOperatorsParams {
    pub active: Option<bool>,
    pub offline: Option<bool>,
}

/// Request body for creating a counter
#[derive(Debug, Deserialize)]
pub struct CreateCounterBody {
    pub name: String,
}

/// Request body for updating a counter
#[derive(Debug, Deserialize)]
pub struct UpdateCounterBody {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for attaching an operator; `operator_id: null` detaches
#[derive(Debug, Deserialize)]
pub struct AttachOperatorBody {
    pub operator_id: Option<String>,
}

/// Response for operator operations
#[derive(Debug, Serialize)]
pub struct OperatorResponse {
    pub user_id: String,
    pub display_name: String,
    pub is_offline: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Operator> for OperatorResponse {
    fn from(operator: Operator) -> Self {
        Self {
            user_id: operator.user_id,
            display_name: operator.display_name,
            is_offline: operator.is_offline,
            is_active: operator.is_active,
            created_at: operator.created_at.to_rfc3339(),
            updated_at: operator.updated_at.to_rfc3339(),
        }
    }
}

/// Response for counter operations
#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Counter> for CounterResponse {
    fn from(counter: Counter) -> Self {
        Self {
            id: counter.id,
            name: counter.name,
            is_active: counter.is_active,
            operator_id: counter.operator_id,
            created_at: counter.created_at.to_rfc3339(),
            updated_at: counter.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing operators
#[derive(Debug, Serialize)]
pub struct ListOperatorsResponse {
    pub operators: Vec<OperatorResponse>,
}

/// Response for listing counters
#[derive(Debug, Serialize)]
pub struct ListCountersResponse {
    pub counters: Vec<CounterResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

fn map_helpdesk_error(e: HelpdeskError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        HelpdeskError::Validation(_) => StatusCode::BAD_REQUEST,
        HelpdeskError::NotFound(_) => StatusCode::NOT_FOUND,
        HelpdeskError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// Register an operator (admin)
pub async fn create_operator(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CreateOperatorBody>,
) -> Result<(StatusCode, Json<OperatorResponse>), (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let request = CreateOperatorRequest {
        user_id: body.user_id,
        display_name: body.display_name,
        is_offline: body.is_offline,
    };

    let operator = state
        .helpdesk_store()
        .create_operator(request)
        .map_err(map_helpdesk_error)?;

    Ok((StatusCode::CREATED, Json(OperatorResponse::from(operator))))
}

/// List operators (staff)
pub async fn list_operators(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(params): Query<ListOperatorsParams>,
) -> Result<Json<ListOperatorsResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let mut filter = OperatorFilter::new();
    if params.active.unwrap_or(false) {
        filter = filter.active_only();
    }
    if let Some(offline) = params.offline {
        filter = filter.with_is_offline(offline);
    }

    let operators = state
        .helpdesk_store()
        .list_operators(&filter)
        .map_err(map_helpdesk_error)?;

    Ok(Json(ListOperatorsResponse {
        operators: operators.into_iter().map(OperatorResponse::from).collect(),
    }))
}

/// Update an operator (admin)
pub async fn update_operator(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateOperatorBody>,
) -> Result<Json<OperatorResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let request = UpdateOperatorRequest {
        display_name: body.display_name,
        is_offline: body.is_offline,
        is_active: body.is_active,
    };

    let operator = state
        .helpdesk_store()
        .update_operator(&user_id, request)
        .map_err(map_helpdesk_error)?;

    Ok(Json(OperatorResponse::from(operator)))
}

/// Create a counter (admin)
pub async fn create_counter(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CreateCounterBody>,
) -> Result<(StatusCode, Json<CounterResponse>), (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let counter = state
        .helpdesk_store()
        .create_counter(&body.name)
        .map_err(map_helpdesk_error)?;

    Ok((StatusCode::CREATED, Json(CounterResponse::from(counter))))
}

/// List counters (staff)
pub async fn list_counters(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<ListCountersResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let counters = state
        .helpdesk_store()
        .list_counters()
        .map_err(map_helpdesk_error)?;

    Ok(Json(ListCountersResponse {
        counters: counters.into_iter().map(CounterResponse::from).collect(),
    }))
}

/// Update a counter (admin)
pub async fn update_counter(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<UpdateCounterBody>,
) -> Result<Json<CounterResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let request = UpdateCounterRequest {
        name: body.name,
        is_active: body.is_active,
    };

    let counter = state
        .helpdesk_store()
        .update_counter(&id, request)
        .map_err(map_helpdesk_error)?;

    Ok(Json(CounterResponse::from(counter)))
}

/// Delete a counter (admin)
pub async fn delete_counter(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<CounterResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let counter = state
        .helpdesk_store()
        .delete_counter(&id)
        .map_err(map_helpdesk_error)?;

    Ok(Json(CounterResponse::from(counter)))
}

/// Attach or detach a counter's operator (admin)
pub async fn attach_operator(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<AttachOperatorBody>,
) -> Result<Json<CounterResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let counter = state
        .helpdesk_store()
        .attach_operator(&id, body.operator_id.as_deref())
        .map_err(map_helpdesk_error)?;

    Ok(Json(CounterResponse::from(counter)))
}
