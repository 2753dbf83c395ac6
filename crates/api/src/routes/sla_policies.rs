//! Route definitions for the `/sla-policies` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::sla_policies;
use crate::state::AppState;

/// Routes mounted at `/sla-policies`.
///
/// ```text
/// GET    /    -> list_policies
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(sla_policies::list_policies))
}
