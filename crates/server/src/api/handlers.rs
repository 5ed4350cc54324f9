//! Health, config, stats and metrics handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use prereg_core::{
    ApplicantFilter, QueueFilter, QueueStatus, SanitizedConfig, TicketFilter, TicketStatus,
};

use crate::state::AppState;

use super::{error_response, require_staff, ErrorResponse};
use super::middleware::AuthIdentity;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    crate::metrics::collect_dynamic_metrics(&state);
    crate::metrics::encode_metrics()
}

#[derive(Serialize)]
pub struct ApplicantStats {
    pub total: i64,
    pub assigned: i64,
    pub confirmed: i64,
}

#[derive(Serialize)]
pub struct GroupStats {
    pub total: usize,
    pub full: usize,
    pub spare_seats: u32,
}

#[derive(Serialize)]
pub struct TicketStats {
    pub open: i64,
    pub in_progress: i64,
    pub closed: i64,
}

#[derive(Serialize)]
pub struct QueueStats {
    pub waiting: i64,
    pub called: i64,
    pub serving: i64,
    pub completed: i64,
    pub skipped: i64,
}

/// Dashboard aggregates, computed from the stores on every request.
#[derive(Serialize)]
pub struct StatsResponse {
    pub applicants: ApplicantStats,
    pub groups: GroupStats,
    pub tickets: TicketStats,
    pub queue_today: QueueStats,
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_staff(&identity)?;

    let enrollment = state.enrollment();
    let applicants = ApplicantStats {
        total: enrollment
            .count_applicants(&ApplicantFilter::new())
            .map_err(internal)?,
        assigned: enrollment
            .count_applicants(&ApplicantFilter::new().with_assigned(true))
            .map_err(internal)?,
        confirmed: enrollment
            .count_applicants(&ApplicantFilter::new().with_join_confirmed(true))
            .map_err(internal)?,
    };

    let group_list = enrollment.list_groups().map_err(internal)?;
    let groups = GroupStats {
        total: group_list.len(),
        full: group_list.iter().filter(|g| g.is_full()).count(),
        spare_seats: group_list.iter().map(|g| g.spare_capacity()).sum(),
    };

    let ticket_store = state.ticket_store();
    let ticket_count = |status: TicketStatus| {
        ticket_store
            .count(&TicketFilter::new().with_status(status))
            .map_err(internal)
    };
    let tickets = TicketStats {
        open: ticket_count(TicketStatus::Open)?,
        in_progress: ticket_count(TicketStatus::InProgress)?,
        closed: ticket_count(TicketStatus::Closed)?,
    };

    let queue_store = state.queue_store();
    let queue_count = |status: QueueStatus| {
        queue_store
            .count(&QueueFilter::new().with_status(status).today_only())
            .map_err(internal)
    };
    let queue_today = QueueStats {
        waiting: queue_count(QueueStatus::Waiting)?,
        called: queue_count(QueueStatus::Called)?,
        serving: queue_count(QueueStatus::Serving)?,
        completed: queue_count(QueueStatus::Completed)?,
        skipped: queue_count(QueueStatus::Skipped)?,
    };

    Ok(Json(StatsResponse {
        applicants,
        groups,
        tickets,
        queue_today,
    }))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
