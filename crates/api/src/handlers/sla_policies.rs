//! Handlers for SLA policy reference data.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use helpdesk_db::repositories::SlaPolicyRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /sla-policies
///
/// List active SLA policies, ordered by name.
pub async fn list_policies(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let policies = SlaPolicyRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: policies }))
}
