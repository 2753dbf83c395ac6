//! SLA policy row model.
//!
//! Policies are reference data: immutable for the lifetime of any ticket
//! attached to them. A ticket without a policy gets `no-sla` metrics.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use helpdesk_core::sla::SlaTerms;
use helpdesk_core::types::Timestamp;

/// A row from the `sla_policies` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SlaPolicy {
    pub id: Uuid,
    pub name: String,
    pub priority: String,
    pub response_time_minutes: i64,
    pub resolution_time_minutes: i64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SlaPolicy {
    /// The thresholds the SLA calculator reads.
    pub fn terms(&self) -> SlaTerms {
        SlaTerms {
            response_time_minutes: self.response_time_minutes,
            resolution_time_minutes: self.resolution_time_minutes,
        }
    }
}
