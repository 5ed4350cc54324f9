//! Audit trail query endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prereg_core::{AuditFilter, AuditRecord};

use crate::state::AppState;

use super::middleware::AuthIdentity;
use super::{error_response, require_staff, ErrorResponse};

/// Maximum allowed limit for audit queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for audit queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for the audit log
#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    /// Filter by the entity an event is about
    pub subject_id: Option<String>,
    /// Filter by event type (e.g. "queue_called")
    pub event_type: Option<String>,
    /// Filter by acting user
    pub user_id: Option<String>,
    /// Maximum number of records to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for audit queries
#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    pub records: Vec<AuditRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query the audit trail (staff)
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = AuditFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref subject_id) = params.subject_id {
        filter = filter.with_subject_id(subject_id);
    }
    if let Some(ref event_type) = params.event_type {
        filter = filter.with_event_type(event_type);
    }
    if let Some(ref user_id) = params.user_id {
        filter = filter.with_user_id(user_id);
    }

    let records = state
        .audit_store()
        .query(&filter)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let count_filter = AuditFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };
    let total = state
        .audit_store()
        .count(&count_filter)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(AuditQueryResponse {
        records,
        total,
        limit,
        offset,
    }))
}
