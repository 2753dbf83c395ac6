//! Ticket lifecycle bookkeeping.
//!
//! [`plan_transition`] validates a requested status change against the flow
//! table and computes the field updates it implies. It is pure: the db layer
//! applies the resulting [`TransitionPlan`] as one conditional update so a
//! concurrent transition on the same ticket cannot silently overwrite this
//! plan's arithmetic.

use crate::error::CoreError;
use crate::sla::minutes_between;
use crate::status::{
    self, STATUS_CLOSED, STATUS_IN_PROGRESS, STATUS_NEW, STATUS_ON_HOLD, STATUS_RESOLVED,
};
use crate::types::Timestamp;

/// The accounting fields of the current ticket row that a transition reads.
#[derive(Debug, Clone)]
pub struct TicketAccounting {
    pub status: String,
    pub created_at: Timestamp,
    pub on_hold_start: Option<Timestamp>,
    /// Cumulative minutes spent on hold so far.
    pub on_hold_duration: i64,
}

/// Field updates implied by one status transition.
///
/// `None` means "leave the column untouched". `breached_at` is deliberately
/// absent: once set it is never changed, and setting it is a separate
/// idempotent step driven by the SLA calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionPlan {
    /// Minutes from creation to first pickup (new -> in_progress only).
    pub response_time: Option<i64>,
    pub resolved_at: Option<Timestamp>,
    pub resolution_note: Option<String>,
    /// Minutes from creation to resolution, net of hold time.
    pub resolution_time: Option<i64>,
    /// Set when entering hold.
    pub on_hold_start: Option<Timestamp>,
    /// Clear `on_hold_start` when leaving hold.
    pub clear_on_hold_start: bool,
    /// New cumulative hold total when leaving hold.
    pub on_hold_duration: Option<i64>,
    pub closed_at: Option<Timestamp>,
}

/// Validate the transition and compute its bookkeeping deltas.
///
/// Rules, per the lifecycle policy:
/// - `new -> in_progress` records the response time.
/// - Entering `resolved` stamps `resolved_at`, stores the resolution note,
///   and records resolution time excluding accumulated hold time.
/// - Entering `on_hold` stamps `on_hold_start`.
/// - Leaving `on_hold` folds the elapsed hold into `on_hold_duration` and
///   clears the start marker. The total never decreases.
/// - Entering `closed` stamps `closed_at`.
pub fn plan_transition(
    current: &TicketAccounting,
    new_status: &str,
    note: Option<&str>,
    now: Timestamp,
) -> Result<TransitionPlan, CoreError> {
    status::validate_transition(&current.status, new_status)?;

    let mut plan = TransitionPlan::default();

    if current.status == STATUS_NEW && new_status == STATUS_IN_PROGRESS {
        plan.response_time = Some(minutes_between(current.created_at, now));
    }

    if current.status == STATUS_ON_HOLD && new_status != STATUS_ON_HOLD {
        // A ticket in on_hold always has a start marker; tolerate a missing
        // one rather than fail the transition.
        let held = current
            .on_hold_start
            .map(|start| minutes_between(start, now))
            .unwrap_or(0);
        plan.on_hold_duration = Some(current.on_hold_duration + held);
        plan.clear_on_hold_start = true;
    }

    if new_status == STATUS_ON_HOLD {
        plan.on_hold_start = Some(now);
    }

    if new_status == STATUS_RESOLVED {
        plan.resolved_at = Some(now);
        plan.resolution_note = note.map(str::to_string);
        let total = minutes_between(current.created_at, now);
        plan.resolution_time = Some(total - current.on_hold_duration);
    }

    if new_status == STATUS_CLOSED {
        plan.closed_at = Some(now);
    }

    Ok(plan)
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{STATUS_UNDER_REVIEW, VALID_STATUSES};
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    fn t0() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> Timestamp {
        t0() + Duration::minutes(minutes)
    }

    fn accounting(status: &str) -> TicketAccounting {
        TicketAccounting {
            status: status.to_string(),
            created_at: t0(),
            on_hold_start: None,
            on_hold_duration: 0,
        }
    }

    #[test]
    fn test_pickup_records_response_time() {
        let plan = plan_transition(&accounting(STATUS_NEW), STATUS_IN_PROGRESS, None, at(12))
            .unwrap();
        assert_eq!(plan.response_time, Some(12));
        assert_eq!(plan.resolved_at, None);
        assert_eq!(plan.closed_at, None);
    }

    #[test]
    fn test_entering_hold_stamps_start() {
        let plan = plan_transition(&accounting(STATUS_IN_PROGRESS), STATUS_ON_HOLD, None, at(10))
            .unwrap();
        assert_eq!(plan.on_hold_start, Some(at(10)));
        assert!(!plan.clear_on_hold_start);
        assert_eq!(plan.on_hold_duration, None);
    }

    #[test]
    fn test_leaving_hold_accumulates_duration() {
        let mut current = accounting(STATUS_ON_HOLD);
        current.on_hold_start = Some(at(10));
        current.on_hold_duration = 5;

        let plan = plan_transition(&current, STATUS_IN_PROGRESS, None, at(40)).unwrap();
        assert_eq!(plan.on_hold_duration, Some(35));
        assert!(plan.clear_on_hold_start);
        assert_eq!(plan.on_hold_start, None);
    }

    #[test]
    fn test_hold_duration_never_decreases() {
        // Whatever the prior total, leaving hold only adds to it.
        for prior in [0, 1, 30, 1000] {
            let mut current = accounting(STATUS_ON_HOLD);
            current.on_hold_start = Some(at(50));
            current.on_hold_duration = prior;

            let plan = plan_transition(&current, STATUS_IN_PROGRESS, None, at(60)).unwrap();
            assert!(plan.on_hold_duration.unwrap() >= prior);
        }
    }

    #[test]
    fn test_resolution_time_excludes_hold_time() {
        // Created at T0, on hold from T0+10 to T0+40 (30m), resolved at T0+100.
        let mut current = accounting(STATUS_UNDER_REVIEW);
        current.on_hold_duration = 30;

        let plan = plan_transition(&current, STATUS_RESOLVED, Some("fixed"), at(100)).unwrap();
        assert_eq!(plan.resolution_time, Some(70));
        assert_eq!(plan.resolved_at, Some(at(100)));
        assert_eq!(plan.resolution_note.as_deref(), Some("fixed"));
    }

    #[test]
    fn test_closing_stamps_closed_at() {
        let plan = plan_transition(&accounting(STATUS_RESOLVED), STATUS_CLOSED, None, at(200))
            .unwrap();
        assert_eq!(plan.closed_at, Some(at(200)));
    }

    #[test]
    fn test_closed_ticket_rejects_all_transitions() {
        for target in VALID_STATUSES {
            let result = plan_transition(&accounting(STATUS_CLOSED), target, None, at(10));
            assert_matches!(result, Err(CoreError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn test_illegal_transition_produces_no_plan() {
        assert_matches!(
            plan_transition(&accounting(STATUS_NEW), STATUS_RESOLVED, None, at(10)),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn test_missing_hold_start_tolerated() {
        let mut current = accounting(STATUS_ON_HOLD);
        current.on_hold_duration = 7;
        current.on_hold_start = None;

        let plan = plan_transition(&current, STATUS_IN_PROGRESS, None, at(40)).unwrap();
        assert_eq!(plan.on_hold_duration, Some(7));
        assert!(plan.clear_on_hold_start);
    }
}
