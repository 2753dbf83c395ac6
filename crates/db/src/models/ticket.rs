//! Ticket row model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use helpdesk_core::lifecycle::TicketAccounting;
use helpdesk_core::sla::TicketSnapshot;
use helpdesk_core::status::display_status;
use helpdesk_core::types::Timestamp;

/// A row from the `tickets` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub ticket_number: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub reporter_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub sla_policy_id: Option<Uuid>,
    pub due_date: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub resolution_note: Option<String>,
    pub on_hold_start: Option<Timestamp>,
    pub on_hold_duration: i64,
    pub response_time: Option<i64>,
    pub resolution_time: Option<i64>,
    pub breached_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Ticket {
    /// The view of this row the SLA calculator reads.
    pub fn sla_snapshot(&self) -> TicketSnapshot {
        TicketSnapshot {
            status: self.status.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
            reporter_id: self.reporter_id,
            assignee_id: self.assignee_id,
        }
    }

    /// The accounting fields the lifecycle planner reads.
    pub fn accounting(&self) -> TicketAccounting {
        TicketAccounting {
            status: self.status.clone(),
            created_at: self.created_at,
            on_hold_start: self.on_hold_start,
            on_hold_duration: self.on_hold_duration,
        }
    }

    /// The four-value vocabulary shown in list views.
    pub fn display_status(&self) -> &'static str {
        display_status(&self.status)
    }
}

/// DTO for creating a new ticket.
#[derive(Debug, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub reporter_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub sla_policy_id: Option<Uuid>,
    pub due_date: Option<Timestamp>,
}

/// DTO for non-lifecycle ticket edits.
///
/// Deliberately has no `status` field: status changes go through the
/// lifecycle transition only.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub sla_policy_id: Option<Uuid>,
    pub due_date: Option<Timestamp>,
}

/// Filter parameters for ticket listing.
#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One row of the per-status ticket counts.
#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Dashboard summary numbers.
#[derive(Debug, Serialize)]
pub struct TicketStats {
    pub by_status: Vec<StatusCount>,
    /// Tickets with a recorded SLA breach that are not yet closed.
    pub open_breaches: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket() -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            ticket_number: "TKT-000001".to_string(),
            title: "Printer on fire".to_string(),
            description: None,
            status: "under_review".to_string(),
            priority: "high".to_string(),
            ticket_type: "incident".to_string(),
            reporter_id: Some(Uuid::new_v4()),
            assignee_id: None,
            service_id: None,
            sla_policy_id: None,
            due_date: None,
            resolved_at: None,
            closed_at: None,
            resolution_note: None,
            on_hold_start: None,
            on_hold_duration: 15,
            response_time: None,
            resolution_time: None,
            breached_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serializes_type_field_name() {
        let json = serde_json::to_value(ticket()).unwrap();
        assert_eq!(json["type"], "incident");
        assert!(json.get("ticket_type").is_none());
    }

    #[test]
    fn test_accounting_view_carries_hold_fields() {
        let t = ticket();
        let acc = t.accounting();
        assert_eq!(acc.status, "under_review");
        assert_eq!(acc.on_hold_duration, 15);
    }

    #[test]
    fn test_display_status_projection() {
        assert_eq!(ticket().display_status(), "in_progress");
    }
}
