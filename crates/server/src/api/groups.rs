//! Group administration API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{AuditEvent, CreateGroupRequest, EnrollmentError, Group, UpdateGroupRequest};

use crate::state::AppState;

use super::middleware::AuthIdentity;
use super::{error_response, require_role, require_staff, ErrorResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a group
#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub invite_link: String,
}

/// Request body for updating a group
#[derive(Debug, Deserialize)]
pub struct UpdateGroupBody {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub invite_link: Option<String>,
}

/// Response for group operations
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub member_count: u32,
    pub is_full: bool,
    pub invite_link: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        let is_full = group.is_full();
        Self {
            id: group.id,
            name: group.name,
            capacity: group.capacity,
            member_count: group.member_count,
            is_full,
            invite_link: group.invite_link,
            created_at: group.created_at.to_rfc3339(),
            updated_at: group.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing groups
#[derive(Debug, Serialize)]
pub struct ListGroupsResponse {
    pub groups: Vec<GroupResponse>,
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

/// Create a new group (admin)
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CreateGroupBody>,
) -> Result<(StatusCode, Json<GroupResponse>), (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let request = CreateGroupRequest {
        name: body.name,
        capacity: body.capacity,
        invite_link: body.invite_link,
    };

    let group = state
        .enrollment()
        .create_group(request)
        .map_err(map_enrollment_error)?;

    state.audit().try_emit(AuditEvent::GroupCreated {
        group_id: group.id.clone(),
        name: group.name.clone(),
        capacity: group.capacity,
        created_by: identity.user_id,
    });
    state.ws_broadcaster().group_updated(&group.id);

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

/// List all groups (staff)
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<ListGroupsResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let groups = state.enrollment().list_groups().map_err(map_enrollment_error)?;

    Ok(Json(ListGroupsResponse {
        groups: groups.into_iter().map(GroupResponse::from).collect(),
    }))
}

/// Get a group by ID (staff)
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<GroupResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    match state.enrollment().get_group(&id) {
        Ok(Some(group)) => Ok(Json(GroupResponse::from(group))),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Group not found: {}", id),
        )),
        Err(e) => Err(map_enrollment_error(e)),
    }
}

/// Update a group (admin)
pub async fn update_group(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<UpdateGroupBody>,
) -> Result<Json<GroupResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let request = UpdateGroupRequest {
        name: body.name,
        capacity: body.capacity,
        invite_link: body.invite_link,
    };

    let group = state
        .enrollment()
        .update_group(&id, request)
        .map_err(map_enrollment_error)?;

    state.audit().try_emit(AuditEvent::GroupUpdated {
        group_id: group.id.clone(),
        updated_by: identity.user_id,
    });
    state.ws_broadcaster().group_updated(&group.id);

    Ok(Json(GroupResponse::from(group)))
}

/// Delete an empty group (admin)
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<GroupResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, &[])?;

    let group = state
        .enrollment()
        .delete_group(&id)
        .map_err(map_enrollment_error)?;

    state.audit().try_emit(AuditEvent::GroupDeleted {
        group_id: group.id.clone(),
        deleted_by: identity.user_id,
    });
    state.ws_broadcaster().group_updated(&group.id);

    Ok(Json(GroupResponse::from(group)))
}
