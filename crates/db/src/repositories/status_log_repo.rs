//! Repository for the append-only `ticket_status_logs` table.
//!
//! Inserts happen inside the transition transaction in
//! [`crate::repositories::TicketRepo::transition`]; this repository only
//! reads the trail back.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::status_log::StatusLog;

/// Column list for `ticket_status_logs` SELECT queries.
const COLUMNS: &str = "id, ticket_id, from_status, to_status, changed_at, note";

/// Provides read operations for the status transition audit trail.
pub struct StatusLogRepo;

impl StatusLogRepo {
    /// List a ticket's transitions in the order they happened.
    pub async fn list_by_ticket(
        pool: &PgPool,
        ticket_id: Uuid,
    ) -> Result<Vec<StatusLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ticket_status_logs \
             WHERE ticket_id = $1 ORDER BY changed_at ASC"
        );
        sqlx::query_as::<_, StatusLog>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
