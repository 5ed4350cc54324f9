//! Applicant API handlers: registration, assignment, confirmation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{
    Applicant, ApplicantFilter, AuditEvent, EnrollmentError, Group, RegisterApplicantRequest,
    Role,
};

use crate::state::AppState;

use super::groups::GroupResponse;
use super::middleware::AuthIdentity;
use super::{error_response, require_role, require_staff, ErrorResponse};

/// Maximum allowed limit for applicant queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for applicant queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registering an applicant
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Query parameters for listing applicants
#[derive(Debug, Deserialize)]
pub struct ListApplicantsParams {
    /// Filter on whether a group was assigned
    pub assigned: Option<bool>,
    /// Filter on join confirmation
    pub confirmed: Option<bool>,
    /// Filter by assigned group
    pub group_id: Option<String>,
    /// Maximum number of applicants to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for applicant operations
#[derive(Debug, Serialize)]
pub struct ApplicantResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_group_id: Option<String>,
    pub join_confirmed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Applicant> for ApplicantResponse {
    fn from(applicant: Applicant) -> Self {
        Self {
            id: applicant.id,
            name: applicant.name,
            email: applicant.email,
            phone: applicant.phone,
            assigned_group_id: applicant.assigned_group_id,
            join_confirmed: applicant.join_confirmed,
            created_at: applicant.created_at.to_rfc3339(),
            updated_at: applicant.updated_at.to_rfc3339(),
        }
    }
}

/// Response for registration: the applicant plus the group they landed in
/// when auto-assignment is on and a seat was free.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub applicant: ApplicantResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupResponse>,
}

/// Response for assignment
#[derive(Debug, Serialize)]
pub struct AssignResponse {
    pub applicant: ApplicantResponse,
    pub group: GroupResponse,
}

/// Response for listing applicants
#[derive(Debug, Serialize)]
pub struct ListApplicantsResponse {
    pub applicants: Vec<ApplicantResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Handlers
// ============================================================================

fn map_enrollment_error(e: EnrollmentError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        EnrollmentError::Validation(_) => StatusCode::BAD_REQUEST,
        EnrollmentError::NotFound(_) => StatusCode::NOT_FOUND,
        EnrollmentError::CapacityExceeded => StatusCode::CONFLICT,
        EnrollmentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// Register a new applicant
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, Json<ErrorResponse>)> {
    let request = RegisterApplicantRequest {
        name: body.name,
        email: body.email,
        phone: body.phone,
    };

    let applicant = state
        .enrollment()
        .register(request)
        .map_err(map_enrollment_error)?;

    state.audit().try_emit(AuditEvent::ApplicantRegistered {
        applicant_id: applicant.id.clone(),
        name: applicant.name.clone(),
        email: applicant.email.clone(),
    });
    state.ws_broadcaster().applicant_updated(&applicant.id);

    // Best-effort auto-assignment: a full portal still accepts the
    // registration and leaves the applicant unassigned.
    let mut group: Option<Group> = None;
    let mut applicant = applicant;
    if state.config().registration.auto_assign {
        match state.assigner().assign(&applicant.id) {
            Ok((assigned_applicant, assigned_group)) => {
                state.ws_broadcaster().group_updated(&assigned_group.id);
                applicant = assigned_applicant;
                group = Some(assigned_group);
            }
            Err(EnrollmentError::CapacityExceeded) => {}
            Err(e) => return Err(map_enrollment_error(e)),
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            applicant: ApplicantResponse::from(applicant),
            group: group.map(GroupResponse::from),
        }),
    ))
}

/// Get an applicant by ID
pub async fn get_applicant(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApplicantResponse>, (StatusCode, Json<ErrorResponse>)> {
    // Applicants can only look themselves up.
    if identity.role == Role::Applicant && identity.user_id != id {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "applicants can only access their own record",
        ));
    }

    match state.enrollment().get_applicant(&id) {
        Ok(Some(applicant)) => Ok(Json(ApplicantResponse::from(applicant))),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Applicant not found: {}", id),
        )),
        Err(e) => Err(map_enrollment_error(e)),
    }
}

/// List applicants with optional filters
pub async fn list_applicants(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(params): Query<ListApplicantsParams>,
) -> Result<Json<ListApplicantsResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = ApplicantFilter::new().with_limit(limit).with_offset(offset);

    if let Some(assigned) = params.assigned {
        filter = filter.with_assigned(assigned);
    }
    if let Some(confirmed) = params.confirmed {
        filter = filter.with_join_confirmed(confirmed);
    }
    if let Some(ref group_id) = params.group_id {
        filter = filter.with_group_id(group_id);
    }

    let applicants = state
        .enrollment()
        .list_applicants(&filter)
        .map_err(map_enrollment_error)?;

    let count_filter = ApplicantFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter.clone()
    };
    let total = state
        .enrollment()
        .count_applicants(&count_filter)
        .map_err(map_enrollment_error)?;

    Ok(Json(ListApplicantsResponse {
        applicants: applicants.into_iter().map(ApplicantResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Assign the applicant to the first group with spare capacity
pub async fn assign_group(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<AssignResponse>, (StatusCode, Json<ErrorResponse>)> {
    if identity.role == Role::Applicant && identity.user_id != id {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "applicants can only assign themselves",
        ));
    }

    let (applicant, group) = state.assigner().assign(&id).map_err(map_enrollment_error)?;

    state.ws_broadcaster().applicant_updated(&applicant.id);
    state.ws_broadcaster().group_updated(&group.id);

    Ok(Json(AssignResponse {
        applicant: ApplicantResponse::from(applicant),
        group: GroupResponse::from(group),
    }))
}

/// Confirm the applicant joined their group (idempotent)
pub async fn confirm_join(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApplicantResponse>, (StatusCode, Json<ErrorResponse>)> {
    if identity.role == Role::Applicant && identity.user_id != id {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "applicants can only confirm for themselves",
        ));
    }

    let applicant = state
        .assigner()
        .confirm_join(&id)
        .map_err(map_enrollment_error)?;

    state.ws_broadcaster().applicant_updated(&applicant.id);

    Ok(Json(ApplicantResponse::from(applicant)))
}

/// Permanently delete an applicant (admin). Cascades to their tickets.
pub async fn delete_applicant(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApplicantResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let applicant = state
        .enrollment()
        .delete_applicant(&id)
        .map_err(map_enrollment_error)?;

    let tickets_removed = state
        .ticket_store()
        .delete_by_applicant(&id)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    state.audit().try_emit(AuditEvent::ApplicantDeleted {
        applicant_id: applicant.id.clone(),
        deleted_by: identity.user_id,
        tickets_removed,
    });
    state.ws_broadcaster().applicant_updated(&applicant.id);
    if let Some(ref group_id) = applicant.assigned_group_id {
        state.ws_broadcaster().group_updated(group_id);
    }

    Ok(Json(ApplicantResponse::from(applicant)))
}
