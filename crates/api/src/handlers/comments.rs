//! Handlers for ticket comments.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use helpdesk_core::error::CoreError;
use helpdesk_db::models::comment::CreateTicketComment;
use helpdesk_db::repositories::{CommentRepo, TicketRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /tickets/{id}/comments
///
/// List a ticket's comments, oldest first.
pub async fn list_comments(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_ticket(&state, ticket_id).await?;
    let comments = CommentRepo::list_by_ticket(&state.pool, ticket_id).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /tickets/{id}/comments
///
/// Add a comment to a ticket. The authenticated caller is the author.
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(input): Json<CreateTicketComment>,
) -> AppResult<impl IntoResponse> {
    if input.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Comment content is required".to_string(),
        ));
    }

    require_ticket(&state, ticket_id).await?;

    let comment =
        CommentRepo::create(&state.pool, ticket_id, Some(auth.user_id), &input, Utc::now()).await?;

    tracing::info!(
        user_id = %auth.user_id,
        ticket_id = %ticket_id,
        comment_id = %comment.id,
        is_internal = comment.is_internal,
        "Comment added"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// Surface a 404 when the parent ticket does not exist.
async fn require_ticket(state: &AppState, id: Uuid) -> AppResult<()> {
    TicketRepo::find_by_id(&state.pool, id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Ticket", id }))
}
