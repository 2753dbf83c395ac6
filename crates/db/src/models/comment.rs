//! Ticket comment row model and DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use helpdesk_core::sla::CommentSnapshot;
use helpdesk_core::types::Timestamp;

/// A row from the `ticket_comments` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Option<Uuid>,
    pub content: String,
    /// Internal comments are staff-only and never count as a first response.
    pub is_internal: bool,
    pub created_at: Timestamp,
}

impl TicketComment {
    /// The view of this row the SLA calculator reads.
    pub fn sla_snapshot(&self) -> CommentSnapshot {
        CommentSnapshot {
            author_id: self.author_id,
            is_internal: self.is_internal,
            created_at: self.created_at,
        }
    }
}

/// DTO for adding a comment to a ticket.
#[derive(Debug, Deserialize)]
pub struct CreateTicketComment {
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}
