//! Announcement API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{
    Announcement, AuditEvent, ContentError, CreateAnnouncementRequest, Role,
    UpdateAnnouncementRequest,
};

use crate::state::AppState;

use super::middleware::AuthIdentity;
use super::{error_response, require_role, ErrorResponse};

/// Staff roles allowed to manage the board.
const CONTENT_ROLES: &[Role] = &[Role::Content];

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an announcement
#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementBody {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

/// Request body for updating an announcement
#[derive(Debug, Deserialize)]
pub struct UpdateAnnouncementBody {
    pub title: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
}

/// Response for announcement operations
#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Announcement> for AnnouncementResponse {
    fn from(announcement: Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title,
            body: announcement.body,
            published: announcement.published,
            created_at: announcement.created_at.to_rfc3339(),
            updated_at: announcement.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing announcements
#[derive(Debug, Serialize)]
pub struct ListAnnouncementsResponse {
    pub announcements: Vec<AnnouncementResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

fn map_content_error(e: ContentError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        ContentError::Validation(_) => StatusCode::BAD_REQUEST,
        ContentError::NotFound(_) => StatusCode::NOT_FOUND,
        ContentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// Create an announcement (content team)
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CreateAnnouncementBody>,
) -> Result<(StatusCode, Json<AnnouncementResponse>), (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, CONTENT_ROLES)?;

    let request = CreateAnnouncementRequest {
        title: body.title,
        body: body.body,
        published: body.published,
    };

    let announcement = state
        .content_store()
        .create(request)
        .map_err(map_content_error)?;

    if announcement.published {
        state.audit().try_emit(AuditEvent::AnnouncementPublished {
            announcement_id: announcement.id.clone(),
            title: announcement.title.clone(),
            published_by: identity.user_id,
        });
    }
    state.ws_broadcaster().announcement_updated(&announcement.id);

    Ok((
        StatusCode::CREATED,
        Json(AnnouncementResponse::from(announcement)),
    ))
}

/// List announcements. Applicants only see published rows.
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<ListAnnouncementsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let published_only = !matches!(identity.role, Role::Admin | Role::Content);

    let announcements = state
        .content_store()
        .list(published_only)
        .map_err(map_content_error)?;

    Ok(Json(ListAnnouncementsResponse {
        announcements: announcements
            .into_iter()
            .map(AnnouncementResponse::from)
            .collect(),
    }))
}

/// Get an announcement by ID. Drafts are hidden from applicants.
pub async fn get_announcement(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<AnnouncementResponse>, (StatusCode, Json<ErrorResponse>)> {
    let announcement = match state.content_store().get(&id) {
        Ok(Some(announcement)) => announcement,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Announcement not found: {}", id),
            ))
        }
        Err(e) => return Err(map_content_error(e)),
    };

    if !announcement.published && !matches!(identity.role, Role::Admin | Role::Content) {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Announcement not found: {}", id),
        ));
    }

    Ok(Json(AnnouncementResponse::from(announcement)))
}

/// Update an announcement (content team)
pub async fn update_announcement(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(body): Json<UpdateAnnouncementBody>,
) -> Result<Json<AnnouncementResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, CONTENT_ROLES)?;

    let was_published = state
        .content_store()
        .get(&id)
        .map_err(map_content_error)?
        .map(|a| a.published)
        .unwrap_or(false);

    let request = UpdateAnnouncementRequest {
        title: body.title,
        body: body.body,
        published: body.published,
    };

    let announcement = state
        .content_store()
        .update(&id, request)
        .map_err(map_content_error)?;

    if announcement.published && !was_published {
        state.audit().try_emit(AuditEvent::AnnouncementPublished {
            announcement_id: announcement.id.clone(),
            title: announcement.title.clone(),
            published_by: identity.user_id,
        });
    }
    state.ws_broadcaster().announcement_updated(&announcement.id);

    Ok(Json(AnnouncementResponse::from(announcement)))
}

/// Delete an announcement (content team)
pub async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<AnnouncementResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_role(&identity, CONTENT_ROLES)?;

    let announcement = state
        .content_store()
        .delete(&id)
        .map_err(map_content_error)?;

    state.ws_broadcaster().announcement_updated(&announcement.id);

    Ok(Json(AnnouncementResponse::from(announcement)))
}
