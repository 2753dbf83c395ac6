//! Status transition audit log row model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use helpdesk_core::types::Timestamp;

/// A row from the append-only `ticket_status_logs` table.
///
/// One row per transition, written in the same transaction as the ticket
/// update. Rows are never modified or deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusLog {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub from_status: String,
    pub to_status: String,
    pub changed_at: Timestamp,
    pub note: Option<String>,
}
