//! Route definitions for the `/tickets` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{comments, tickets};
use crate::state::AppState;

/// Routes mounted at `/tickets`.
///
/// ```text
/// GET    /                 -> list_tickets
/// POST   /                 -> create_ticket
/// GET    /stats            -> ticket_stats
/// GET    /{id}             -> get_ticket
/// PATCH  /{id}             -> update_ticket
/// PUT    /{id}/status      -> change_status
/// GET    /{id}/metrics     -> get_ticket_metrics
/// GET    /{id}/history     -> get_ticket_history
/// GET    /{id}/comments    -> list_comments
/// POST   /{id}/comments    -> create_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tickets::list_tickets).post(tickets::create_ticket))
        // Registered before /{id} so "stats" never parses as a ticket id.
        .route("/stats", get(tickets::ticket_stats))
        .route(
            "/{id}",
            get(tickets::get_ticket).patch(tickets::update_ticket),
        )
        .route("/{id}/status", put(tickets::change_status))
        .route("/{id}/metrics", get(tickets::get_ticket_metrics))
        .route("/{id}/history", get(tickets::get_ticket_history))
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
}
