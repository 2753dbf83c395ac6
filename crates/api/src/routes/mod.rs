pub mod health;
pub mod sla_policies;
pub mod tickets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /tickets                      list, create
/// /tickets/stats                dashboard counts (GET)
/// /tickets/{id}                 get detail, patch
/// /tickets/{id}/status          lifecycle transition (PUT)
/// /tickets/{id}/metrics         SLA metrics as of now (GET)
/// /tickets/{id}/history         status transition trail (GET)
/// /tickets/{id}/comments        list, add
///
/// /sla-policies                 list active policies (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tickets", tickets::router())
        .nest("/sla-policies", sla_policies::router())
}
