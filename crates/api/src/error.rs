//! API error types and their HTTP mappings.
//!
//! Handlers return [`AppResult<T>`]; every error variant converts into a JSON
//! body of the shape `{ "error": "...", "code": "..." }` with the matching
//! HTTP status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use helpdesk_core::error::CoreError;
use helpdesk_db::repositories::TransitionError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Core(e) => AppError::Core(e),
            TransitionError::Store(e) => AppError::Database(e),
        }
    }
}

impl AppError {
    /// HTTP status code plus machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::InvalidTransition { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_TRANSITION")
                }
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            AppError::Database(e) => classify_sqlx_error(e),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Map an sqlx error to a status/code pair.
///
/// Unique-constraint violations (Postgres code 23505) on our `uq_`-prefixed
/// constraints surface as 409s so clients can retry with different input.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        sqlx::Error::Database(db) => {
            let unique = db.code().as_deref() == Some("23505")
                && db.constraint().is_some_and(|c| c.starts_with("uq_"));
            if unique {
                (StatusCode::CONFLICT, "DUPLICATE")
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Hide internals from clients; the full error goes to the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::Core(CoreError::NotFound {
            entity: "ticket",
            id: Uuid::new_v4(),
        });
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));
    }

    #[test]
    fn test_invalid_transition_maps_to_400() {
        let err = AppError::Core(CoreError::InvalidTransition {
            from: "closed".into(),
            to: "new".into(),
        });
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_TRANSITION")
        );
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = AppError::Core(CoreError::Conflict("stale".into()));
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let err = AppError::Core(CoreError::Forbidden("not yours".into()));
        assert_eq!(err.status_and_code(), (StatusCode::FORBIDDEN, "FORBIDDEN"));
    }
}
