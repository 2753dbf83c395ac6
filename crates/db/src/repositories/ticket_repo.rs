//! Repository for the `tickets` table, including the lifecycle transition.

use sqlx::PgPool;
use uuid::Uuid;

use helpdesk_core::error::CoreError;
use helpdesk_core::lifecycle::{plan_transition, TransitionPlan};
use helpdesk_core::sla::{compute_sla_metrics, CommentSnapshot, SlaStatus};
use helpdesk_core::types::Timestamp;

use crate::models::ticket::{
    CreateTicket, StatusCount, Ticket, TicketQuery, TicketStats, UpdateTicket,
};
use crate::repositories::{CommentRepo, SlaPolicyRepo};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `tickets` SELECT queries.
const COLUMNS: &str = "\
    id, ticket_number, title, description, status, priority, ticket_type, \
    reporter_id, assignee_id, service_id, sla_policy_id, due_date, \
    resolved_at, closed_at, resolution_note, on_hold_start, on_hold_duration, \
    response_time, resolution_time, breached_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error from the lifecycle transition: either a domain rule rejected the
/// change, or the store failed.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// TicketRepo
// ---------------------------------------------------------------------------

/// Provides CRUD operations and the status transition for tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a new ticket in the initial `new` state with a generated
    /// ticket number and zeroed accounting fields.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTicket,
        now: Timestamp,
    ) -> Result<Ticket, sqlx::Error> {
        let query = format!(
            "INSERT INTO tickets \
                 (id, ticket_number, title, description, status, priority, ticket_type, \
                  reporter_id, assignee_id, service_id, sla_policy_id, due_date, \
                  created_at, updated_at) \
             VALUES \
                 ($1, 'TKT-' || lpad(nextval('ticket_number_seq')::text, 6, '0'), \
                  $2, $3, 'new', $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Ticket>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.priority)
            .bind(&input.ticket_type)
            .bind(input.reporter_id)
            .bind(input.assignee_id)
            .bind(input.service_id)
            .bind(input.sla_policy_id)
            .bind(input.due_date)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a ticket by id.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tickets with optional filters, newest first.
    pub async fn list(pool: &PgPool, params: &TicketQuery) -> Result<Vec<Ticket>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).min(500);
        let offset = params.offset.unwrap_or(0);

        let (where_clause, bind_values, bind_idx) = build_ticket_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM tickets {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, Ticket>(&query);
        for val in &bind_values {
            q = bind_value(q, val);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Apply a non-lifecycle patch (title, assignment, priority, links).
    ///
    /// The `status <> 'closed'` guard enforces that closed tickets accept no
    /// further mutation; callers distinguish "missing" from "closed" via
    /// [`Self::find_by_id`].
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        dto: &UpdateTicket,
        now: Timestamp,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let (set_clause, bind_values, _) = build_ticket_patch(dto);

        let query = format!(
            "UPDATE tickets SET {set_clause} \
             WHERE id = $1 AND status <> 'closed' RETURNING {COLUMNS}"
        );

        let mut q = sqlx::query_as::<_, Ticket>(&query).bind(id).bind(now);
        for val in &bind_values {
            q = bind_value(q, val);
        }
        q.fetch_optional(pool).await
    }

    /// Per-status counts plus the number of breached, still-open tickets.
    pub async fn stats(pool: &PgPool) -> Result<TicketStats, sqlx::Error> {
        let by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*)::BIGINT AS count FROM tickets GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;

        let open_breaches = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM tickets \
             WHERE breached_at IS NOT NULL AND status <> 'closed'",
        )
        .fetch_one(pool)
        .await?;

        Ok(TicketStats {
            by_status,
            open_breaches,
        })
    }

    /// Execute a lifecycle transition.
    ///
    /// Loads the current row, validates the requested change against the flow
    /// table, computes the bookkeeping deltas, then applies everything inside
    /// one transaction:
    ///
    /// 1. Conditional ticket update (`WHERE status = <expected>`), so a
    ///    concurrent transition loses cleanly as a `Conflict` instead of
    ///    silently overwriting this one's arithmetic.
    /// 2. Breach marker, only if the recomputed metrics show a resolution
    ///    breach and `breached_at` is still unset (never overwritten).
    /// 3. Append to the status log.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        new_status: &str,
        note: Option<&str>,
        now: Timestamp,
    ) -> Result<Ticket, TransitionError> {
        let ticket = Self::find_by_id(pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Ticket",
                id,
            })?;

        let plan = plan_transition(&ticket.accounting(), new_status, note, now)?;

        // Policy and comments are reference data for the breach check; they
        // do not change during the transition.
        let policy = match ticket.sla_policy_id {
            Some(policy_id) => SlaPolicyRepo::find_by_id(pool, policy_id).await?,
            None => None,
        };
        let comments: Vec<CommentSnapshot> = CommentRepo::list_by_ticket(pool, id)
            .await?
            .iter()
            .map(|c| c.sla_snapshot())
            .collect();

        let mut tx = pool.begin().await?;

        let (set_clause, bind_values, guard_idx) = build_transition_update(&plan);
        let query = format!(
            "UPDATE tickets SET {set_clause} \
             WHERE id = $1 AND status = ${guard_idx} \
             RETURNING {COLUMNS}"
        );

        let mut q = sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(new_status)
            .bind(now);
        for val in &bind_values {
            q = bind_value(q, val);
        }
        let updated = q.bind(&ticket.status).fetch_optional(&mut *tx).await?;

        let Some(mut updated) = updated else {
            return Err(CoreError::Conflict(format!(
                "Ticket {id} was modified concurrently; re-read before retrying"
            ))
            .into());
        };

        let terms = policy.as_ref().map(|p| p.terms());
        let metrics = compute_sla_metrics(&updated.sla_snapshot(), terms.as_ref(), &comments, now);

        if metrics.resolution_status == SlaStatus::Breached && updated.breached_at.is_none() {
            let query = format!(
                "UPDATE tickets SET breached_at = $2 \
                 WHERE id = $1 AND breached_at IS NULL \
                 RETURNING {COLUMNS}"
            );
            if let Some(marked) = sqlx::query_as::<_, Ticket>(&query)
                .bind(id)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?
            {
                updated = marked;
            }
        }

        sqlx::query(
            "INSERT INTO ticket_status_logs (id, ticket_id, from_status, to_status, changed_at, note) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(&ticket.status)
        .bind(new_status)
        .bind(now)
        .bind(note)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            ticket_id = %id,
            from = %ticket.status,
            to = %new_status,
            "Ticket status changed"
        );

        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built ticket queries.
enum BindValue {
    Text(String),
    BigInt(i64),
    Id(Uuid),
    Ts(Timestamp),
}

/// Bind one `BindValue` to a sqlx `QueryAs`.
fn bind_value<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    val: &'q BindValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    match val {
        BindValue::Text(v) => q.bind(v.as_str()),
        BindValue::BigInt(v) => q.bind(*v),
        BindValue::Id(v) => q.bind(*v),
        BindValue::Ts(v) => q.bind(*v),
    }
}

/// Build the SET clause for a non-lifecycle patch from its [`UpdateTicket`] DTO.
///
/// Bind layout: `$1` id, `$2` now (updated_at), `$3..` patch values. Returns
/// `(set_clause, bind_values, next_bind_index)`.
fn build_ticket_patch(dto: &UpdateTicket) -> (String, Vec<BindValue>, u32) {
    let mut sets: Vec<String> = vec!["updated_at = $2".to_string()];
    let mut bind_idx = 3u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref title) = dto.title {
        sets.push(format!("title = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(title.clone()));
    }
    if let Some(ref description) = dto.description {
        sets.push(format!("description = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(description.clone()));
    }
    if let Some(ref priority) = dto.priority {
        sets.push(format!("priority = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(priority.clone()));
    }
    if let Some(assignee_id) = dto.assignee_id {
        sets.push(format!("assignee_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Id(assignee_id));
    }
    if let Some(service_id) = dto.service_id {
        sets.push(format!("service_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Id(service_id));
    }
    if let Some(sla_policy_id) = dto.sla_policy_id {
        sets.push(format!("sla_policy_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Id(sla_policy_id));
    }
    if let Some(due_date) = dto.due_date {
        sets.push(format!("due_date = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Ts(due_date));
    }

    (sets.join(", "), bind_values, bind_idx)
}

/// Build a WHERE clause and bind values from `TicketQuery` filter parameters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if no filters are active, or starts with `WHERE `.
fn build_ticket_filter(params: &TicketQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref status) = params.status {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.clone()));
    }
    if let Some(ref priority) = params.priority {
        conditions.push(format!("priority = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(priority.clone()));
    }
    if let Some(assignee_id) = params.assignee_id {
        conditions.push(format!("assignee_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Id(assignee_id));
    }
    if let Some(reporter_id) = params.reporter_id {
        conditions.push(format!("reporter_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Id(reporter_id));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Build the SET clause for a transition update from its [`TransitionPlan`].
///
/// Bind layout: `$1` id, `$2` new status, `$3` now (updated_at), `$4..` plan
/// values, final index the expected-status guard. Returns
/// `(set_clause, bind_values, guard_index)`.
fn build_transition_update(plan: &TransitionPlan) -> (String, Vec<BindValue>, u32) {
    let mut sets: Vec<String> = vec!["status = $2".to_string(), "updated_at = $3".to_string()];
    let mut bind_idx = 4u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(response_time) = plan.response_time {
        sets.push(format!("response_time = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(response_time));
    }
    if let Some(resolved_at) = plan.resolved_at {
        sets.push(format!("resolved_at = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Ts(resolved_at));
    }
    if let Some(ref note) = plan.resolution_note {
        sets.push(format!("resolution_note = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(note.clone()));
    }
    if let Some(resolution_time) = plan.resolution_time {
        sets.push(format!("resolution_time = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(resolution_time));
    }
    if let Some(on_hold_start) = plan.on_hold_start {
        sets.push(format!("on_hold_start = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Ts(on_hold_start));
    }
    if plan.clear_on_hold_start {
        sets.push("on_hold_start = NULL".to_string());
    }
    if let Some(on_hold_duration) = plan.on_hold_duration {
        sets.push(format!("on_hold_duration = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(on_hold_duration));
    }
    if let Some(closed_at) = plan.closed_at {
        sets.push(format!("closed_at = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Ts(closed_at));
    }

    (sets.join(", "), bind_values, bind_idx)
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_plan_touches_only_status_and_updated_at() {
        let (set_clause, binds, guard_idx) = build_transition_update(&TransitionPlan::default());
        assert_eq!(set_clause, "status = $2, updated_at = $3");
        assert!(binds.is_empty());
        assert_eq!(guard_idx, 4);
    }

    #[test]
    fn test_resolution_plan_sets_resolution_columns() {
        let plan = TransitionPlan {
            resolved_at: Some(t0()),
            resolution_note: Some("done".to_string()),
            resolution_time: Some(70),
            ..Default::default()
        };
        let (set_clause, binds, guard_idx) = build_transition_update(&plan);

        assert_eq!(
            set_clause,
            "status = $2, updated_at = $3, resolved_at = $4, \
             resolution_note = $5, resolution_time = $6"
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(guard_idx, 7);
    }

    #[test]
    fn test_hold_exit_plan_clears_start_without_bind() {
        let plan = TransitionPlan {
            clear_on_hold_start: true,
            on_hold_duration: Some(35),
            ..Default::default()
        };
        let (set_clause, binds, guard_idx) = build_transition_update(&plan);

        assert_eq!(
            set_clause,
            "status = $2, updated_at = $3, on_hold_start = NULL, on_hold_duration = $4"
        );
        assert_eq!(binds.len(), 1);
        assert_eq!(guard_idx, 5);
    }

    #[test]
    fn test_filter_builder_indexes_are_sequential() {
        let params = TicketQuery {
            status: Some("new".to_string()),
            priority: Some("high".to_string()),
            assignee_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let (where_clause, binds, next_idx) = build_ticket_filter(&params);

        assert_eq!(
            where_clause,
            "WHERE status = $1 AND priority = $2 AND assignee_id = $3"
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(next_idx, 4);
    }

    #[test]
    fn test_filter_builder_no_filters() {
        let (where_clause, binds, next_idx) = build_ticket_filter(&TicketQuery::default());
        assert!(where_clause.is_empty());
        assert!(binds.is_empty());
        assert_eq!(next_idx, 1);
    }

    #[test]
    fn test_patch_builder_indexes_are_sequential() {
        let dto = UpdateTicket {
            title: Some("New title".to_string()),
            priority: Some("high".to_string()),
            due_date: Some(t0()),
            ..Default::default()
        };
        let (set_clause, binds, next_idx) = build_ticket_patch(&dto);

        assert_eq!(
            set_clause,
            "updated_at = $2, title = $3, priority = $4, due_date = $5"
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(next_idx, 6);
    }

    #[test]
    fn test_empty_patch_touches_only_updated_at() {
        let (set_clause, binds, next_idx) = build_ticket_patch(&UpdateTicket::default());
        assert_eq!(set_clause, "updated_at = $2");
        assert!(binds.is_empty());
        assert_eq!(next_idx, 3);
    }

    #[test]
    fn test_domain_rejection_keeps_its_shape_through_transition_error() {
        let err = TransitionError::from(CoreError::Conflict("modified concurrently".to_string()));
        assert_matches!(err, TransitionError::Core(CoreError::Conflict(_)));

        let err = TransitionError::from(CoreError::InvalidTransition {
            from: "closed".to_string(),
            to: "new".to_string(),
        });
        assert_matches!(err, TransitionError::Core(CoreError::InvalidTransition { .. }));
    }
}
