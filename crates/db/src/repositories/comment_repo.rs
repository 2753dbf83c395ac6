//! Repository for the `ticket_comments` table.

use sqlx::PgPool;
use uuid::Uuid;

use helpdesk_core::types::Timestamp;

use crate::models::comment::{CreateTicketComment, TicketComment};

/// Column list for `ticket_comments` SELECT queries.
const COLUMNS: &str = "id, ticket_id, author_id, content, is_internal, created_at";

/// Provides query and insert operations for ticket comments.
pub struct CommentRepo;

impl CommentRepo {
    /// List a ticket's comments, oldest first.
    pub async fn list_by_ticket(
        pool: &PgPool,
        ticket_id: Uuid,
    ) -> Result<Vec<TicketComment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ticket_comments \
             WHERE ticket_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, TicketComment>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }

    /// Add a comment to a ticket.
    pub async fn create(
        pool: &PgPool,
        ticket_id: Uuid,
        author_id: Option<Uuid>,
        input: &CreateTicketComment,
        now: Timestamp,
    ) -> Result<TicketComment, sqlx::Error> {
        let query = format!(
            "INSERT INTO ticket_comments (id, ticket_id, author_id, content, is_internal, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TicketComment>(&query)
            .bind(Uuid::new_v4())
            .bind(ticket_id)
            .bind(author_id)
            .bind(&input.content)
            .bind(input.is_internal)
            .bind(now)
            .fetch_one(pool)
            .await
    }
}
