//! Handlers for the ticket resource: CRUD, lifecycle transitions, SLA
//! metrics, history, and dashboard stats.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use helpdesk_core::error::CoreError;
use helpdesk_core::sla::{compute_sla_metrics, CommentSnapshot, SlaMetrics};
use helpdesk_core::status::{validate_priority, validate_ticket_type};
use helpdesk_db::models::comment::TicketComment;
use helpdesk_db::models::sla_policy::SlaPolicy;
use helpdesk_db::models::status_log::StatusLog;
use helpdesk_db::models::ticket::{CreateTicket, Ticket, TicketQuery, UpdateTicket};
use helpdesk_db::repositories::{CommentRepo, SlaPolicyRepo, StatusLogRepo, TicketRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

/// Request body for a lifecycle transition.
#[derive(Debug, serde::Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
    pub resolution_note: Option<String>,
}

/// Full ticket view: the row plus everything a detail screen renders.
#[derive(Debug, serde::Serialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub comments: Vec<TicketComment>,
    pub sla_policy: Option<SlaPolicy>,
    pub history: Vec<StatusLog>,
    pub metrics: SlaMetrics,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /tickets?status=&priority=&assignee_id=&reporter_id=&limit=&offset=
///
/// List tickets with optional filters, newest first.
pub async fn list_tickets(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TicketQuery>,
) -> AppResult<impl IntoResponse> {
    let tickets = TicketRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: tickets }))
}

/// POST /tickets
///
/// Create a new ticket in the `new` state. The reporter defaults to the
/// authenticated caller when the body does not name one.
pub async fn create_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateTicket>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("Ticket title is required".to_string()));
    }
    validate_priority(&input.priority)?;
    validate_ticket_type(&input.ticket_type)?;

    if input.reporter_id.is_none() {
        input.reporter_id = Some(auth.user_id);
    }

    let ticket = TicketRepo::create(&state.pool, &input, Utc::now()).await?;

    tracing::info!(
        user_id = %auth.user_id,
        ticket_id = %ticket.id,
        ticket_number = %ticket.ticket_number,
        "Ticket created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: ticket })))
}

/// GET /tickets/{id}
///
/// Get a ticket with its comments, policy, transition history, and the SLA
/// metrics computed as of now.
pub async fn get_ticket(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let (ticket, policy, comments) = load_ticket_context(&state, id).await?;
    let history = StatusLogRepo::list_by_ticket(&state.pool, id).await?;

    let metrics = metrics_for(&ticket, policy.as_ref(), &comments);

    Ok(Json(DataResponse {
        data: TicketDetail {
            ticket,
            comments,
            sla_policy: policy,
            history,
            metrics,
        },
    }))
}

/// GET /tickets/{id}/metrics
///
/// SLA metrics for one ticket, computed as of now.
pub async fn get_ticket_metrics(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let (ticket, policy, comments) = load_ticket_context(&state, id).await?;
    let metrics = metrics_for(&ticket, policy.as_ref(), &comments);
    Ok(Json(DataResponse { data: metrics }))
}

/// GET /tickets/{id}/history
///
/// The ticket's status transition trail, oldest first.
pub async fn get_ticket_history(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_ticket(&state, id).await?;
    let history = StatusLogRepo::list_by_ticket(&state.pool, id).await?;
    Ok(Json(DataResponse { data: history }))
}

/// PATCH /tickets/{id}
///
/// Apply a non-lifecycle edit (title, priority, assignment, links). Closed
/// tickets reject all edits with a conflict.
pub async fn update_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTicket>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref title) = input.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Ticket title cannot be empty".to_string(),
            ));
        }
    }
    if let Some(ref priority) = input.priority {
        validate_priority(priority)?;
    }

    let updated = TicketRepo::update(&state.pool, id, &input, Utc::now()).await?;

    let Some(ticket) = updated else {
        // The update matched no row: either the ticket is gone, or the
        // closed guard filtered it out.
        require_ticket(&state, id).await?;
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Ticket {id} is closed and cannot be edited"
        ))));
    };

    tracing::info!(user_id = %auth.user_id, ticket_id = %id, "Ticket updated");

    Ok(Json(DataResponse { data: ticket }))
}

/// PUT /tickets/{id}/status
///
/// Execute a lifecycle transition. Allowed for admins, the assignee, and the
/// reporter.
pub async fn change_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ChangeStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let ticket = require_ticket(&state, id).await?;

    let involved = ticket.assignee_id == Some(auth.user_id)
        || ticket.reporter_id == Some(auth.user_id);
    if !auth.is_admin() && !involved {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only admins, the assignee, or the reporter may change a ticket's status".to_string(),
        )));
    }

    let updated = TicketRepo::transition(
        &state.pool,
        id,
        &input.status,
        input.resolution_note.as_deref(),
        Utc::now(),
    )
    .await?;

    Ok(Json(DataResponse { data: updated }))
}

/// GET /tickets/stats
///
/// Per-status counts plus the number of breached, still-open tickets.
pub async fn ticket_stats(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = TicketRepo::stats(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Fetch a ticket or surface a 404.
async fn require_ticket(state: &AppState, id: Uuid) -> AppResult<Ticket> {
    TicketRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Ticket", id }))
}

/// Load the ticket plus the reference data the SLA calculator reads.
async fn load_ticket_context(
    state: &AppState,
    id: Uuid,
) -> AppResult<(Ticket, Option<SlaPolicy>, Vec<TicketComment>)> {
    let ticket = require_ticket(state, id).await?;

    let policy = match ticket.sla_policy_id {
        Some(policy_id) => SlaPolicyRepo::find_by_id(&state.pool, policy_id).await?,
        None => None,
    };
    let comments = CommentRepo::list_by_ticket(&state.pool, id).await?;

    Ok((ticket, policy, comments))
}

/// Compute SLA metrics for a ticket as of now.
fn metrics_for(ticket: &Ticket, policy: Option<&SlaPolicy>, comments: &[TicketComment]) -> SlaMetrics {
    let terms = policy.map(|p| p.terms());
    let snapshots: Vec<CommentSnapshot> = comments.iter().map(|c| c.sla_snapshot()).collect();
    compute_sla_metrics(&ticket.sla_snapshot(), terms.as_ref(), &snapshots, Utc::now())
}
