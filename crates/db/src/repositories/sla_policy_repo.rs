//! Repository for the `sla_policies` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::sla_policy::SlaPolicy;

/// Column list for `sla_policies` SELECT queries.
const COLUMNS: &str = "\
    id, name, priority, response_time_minutes, resolution_time_minutes, \
    is_active, created_at, updated_at";

/// Provides read operations for SLA policies (reference data).
pub struct SlaPolicyRepo;

impl SlaPolicyRepo {
    /// Find a policy by id.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<SlaPolicy>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sla_policies WHERE id = $1");
        sqlx::query_as::<_, SlaPolicy>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active policies, ordered by name.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<SlaPolicy>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sla_policies WHERE is_active = TRUE ORDER BY name"
        );
        sqlx::query_as::<_, SlaPolicy>(&query).fetch_all(pool).await
    }
}
