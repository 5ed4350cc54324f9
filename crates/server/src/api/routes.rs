use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    announcements, applicants, audit, groups, handlers, helpdesk, queue, tickets, ws,
    middleware::{auth_middleware, metrics_middleware},
};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/stats", get(handlers::stats))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Applicants
        .route("/applicants", post(applicants::register))
        .route("/applicants", get(applicants::list_applicants))
        .route("/applicants/{id}", get(applicants::get_applicant))
        .route("/applicants/{id}", delete(applicants::delete_applicant))
        .route("/applicants/{id}/assign-group", post(applicants::assign_group))
        .route("/applicants/{id}/confirm-join", post(applicants::confirm_join))
        // Groups
        .route("/groups", post(groups::create_group))
        .route("/groups", get(groups::list_groups))
        .route("/groups/{id}", get(groups::get_group))
        .route("/groups/{id}", put(groups::update_group))
        .route("/groups/{id}", delete(groups::delete_group))
        // Help tickets
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/balance", post(tickets::balance_tickets))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}", delete(tickets::delete_ticket))
        .route("/tickets/{id}/messages", get(tickets::list_messages))
        .route("/tickets/{id}/messages", post(tickets::add_message))
        .route("/tickets/{id}/status", post(tickets::update_status))
        .route("/tickets/{id}/priority", post(tickets::update_priority))
        .route("/tickets/{id}/assign", post(tickets::assign_ticket))
        // Walk-in queue
        .route("/queue/tickets", post(queue::create_queue_ticket))
        .route("/queue/tickets", get(queue::list_queue_tickets))
        .route("/queue/call-next", post(queue::call_next))
        .route("/queue/tickets/{id}/recall", post(queue::recall))
        .route("/queue/tickets/{id}/serve", post(queue::start_serving))
        .route("/queue/tickets/{id}/complete", post(queue::complete))
        .route("/queue/tickets/{id}/skip", post(queue::skip))
        // Helpdesk staffing
        .route("/operators", post(helpdesk::create_operator))
        .route("/operators", get(helpdesk::list_operators))
        .route("/operators/{id}", put(helpdesk::update_operator))
        .route("/counters", post(helpdesk::create_counter))
        .route("/counters", get(helpdesk::list_counters))
        .route("/counters/{id}", put(helpdesk::update_counter))
        .route("/counters/{id}", delete(helpdesk::delete_counter))
        .route("/counters/{id}/operator", post(helpdesk::attach_operator))
        // Announcements
        .route("/announcements", post(announcements::create_announcement))
        .route("/announcements", get(announcements::list_announcements))
        .route("/announcements/{id}", get(announcements::get_announcement))
        .route("/announcements/{id}", put(announcements::update_announcement))
        .route("/announcements/{id}", delete(announcements::delete_announcement))
        // Realtime
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
