//! SLA metrics calculator.
//!
//! [`compute_sla_metrics`] is a pure projection of ticket data: it takes a
//! ticket snapshot, the policy terms, the comment history, and an explicit
//! `now`, and derives response/resolution elapsed time, per-metric SLA
//! status, the first breach timestamp, and progress figures. Calling it
//! repeatedly with the same inputs yields the same output; persisting any of
//! its results (e.g. the breach marker) is the lifecycle layer's job.

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use crate::status::STATUS_IN_PROGRESS;
use crate::types::Timestamp;

/// Fraction of a threshold at which a pending metric becomes `at-risk`.
pub const AT_RISK_RATIO: f64 = 0.8;

/// Per-metric SLA state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlaStatus {
    OnTrack,
    AtRisk,
    Breached,
    Met,
    NoSla,
}

/// The ticket fields the calculator reads.
///
/// Kept separate from the persistence row type so the calculator stays free
/// of database concerns; the db layer maps its row into this.
#[derive(Debug, Clone)]
pub struct TicketSnapshot {
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub reporter_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

/// The comment fields the calculator reads.
#[derive(Debug, Clone)]
pub struct CommentSnapshot {
    pub author_id: Option<Uuid>,
    pub is_internal: bool,
    pub created_at: Timestamp,
}

/// SLA policy thresholds, in minutes.
#[derive(Debug, Clone, Copy)]
pub struct SlaTerms {
    pub response_time_minutes: i64,
    pub resolution_time_minutes: i64,
}

/// Computed SLA metrics for one ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaMetrics {
    /// Minutes from creation to first response, once detected.
    pub response_time: Option<i64>,
    /// Minutes from creation to resolution, once resolved.
    pub resolution_time: Option<i64>,
    pub first_response_at: Option<Timestamp>,
    pub response_status: SlaStatus,
    pub resolution_status: SlaStatus,
    /// Earliest timestamp at which either metric crossed its threshold.
    pub breached_at: Option<Timestamp>,
    /// Elapsed time as a percentage of the resolution threshold (may exceed 100).
    pub percentage_elapsed: f64,
    /// Resolution threshold minus elapsed minutes (negative once breached).
    pub time_remaining: Option<i64>,
}

impl SlaMetrics {
    /// Metrics for a ticket with no SLA policy attached.
    pub fn no_sla() -> Self {
        Self {
            response_time: None,
            resolution_time: None,
            first_response_at: None,
            response_status: SlaStatus::NoSla,
            resolution_status: SlaStatus::NoSla,
            breached_at: None,
            percentage_elapsed: 0.0,
            time_remaining: None,
        }
    }
}

/// Whole minutes between two timestamps, truncated toward zero.
///
/// Historical values were recorded with millisecond differences truncated to
/// whole minutes, so this must truncate rather than round.
pub fn minutes_between(from: Timestamp, to: Timestamp) -> i64 {
    (to - from).num_minutes()
}

/// Detect the first staff response, in priority order:
///
/// 1. The ticket is already `in_progress` -- the status change was the
///    response, approximated by `updated_at`.
/// 2. The earliest non-internal comment by someone other than the reporter.
/// 3. An assignee is set -- assignment implies response (`updated_at`).
/// 4. Otherwise there has been no response.
fn find_first_response(
    ticket: &TicketSnapshot,
    comments: &[CommentSnapshot],
) -> Option<Timestamp> {
    if ticket.status == STATUS_IN_PROGRESS {
        return Some(ticket.updated_at);
    }

    let first_staff_comment = comments
        .iter()
        .filter(|c| c.author_id != ticket.reporter_id && !c.is_internal)
        .map(|c| c.created_at)
        .min();

    if first_staff_comment.is_some() {
        return first_staff_comment;
    }

    if ticket.assignee_id.is_some() {
        return Some(ticket.updated_at);
    }

    None
}

/// Derive one metric's status from its finish time (if any), the elapsed
/// minutes so far, and the threshold.
fn metric_status(elapsed_to_finish: Option<i64>, elapsed_now: i64, threshold: i64) -> SlaStatus {
    match elapsed_to_finish {
        Some(finish) => {
            if finish <= threshold {
                SlaStatus::Met
            } else {
                SlaStatus::Breached
            }
        }
        None => {
            if elapsed_now >= threshold {
                SlaStatus::Breached
            } else if (elapsed_now as f64) >= (threshold as f64) * AT_RISK_RATIO {
                SlaStatus::AtRisk
            } else {
                SlaStatus::OnTrack
            }
        }
    }
}

/// Compute SLA metrics for a ticket against its policy and comment history.
///
/// Without a policy every status collapses to `no-sla`. Each metric is
/// evaluated independently; when both have breached, `breached_at` is the
/// earlier of the two computed breach instants (not assumed to be the
/// response one).
pub fn compute_sla_metrics(
    ticket: &TicketSnapshot,
    policy: Option<&SlaTerms>,
    comments: &[CommentSnapshot],
    now: Timestamp,
) -> SlaMetrics {
    let Some(terms) = policy else {
        return SlaMetrics::no_sla();
    };

    let first_response_at = find_first_response(ticket, comments);
    let response_time = first_response_at.map(|t| minutes_between(ticket.created_at, t));
    let resolution_time = ticket
        .resolved_at
        .map(|t| minutes_between(ticket.created_at, t));

    let elapsed = minutes_between(ticket.created_at, now);

    let response_status = metric_status(response_time, elapsed, terms.response_time_minutes);
    let resolution_status = metric_status(resolution_time, elapsed, terms.resolution_time_minutes);

    let response_breach = (response_status == SlaStatus::Breached)
        .then(|| ticket.created_at + Duration::minutes(terms.response_time_minutes));
    let resolution_breach = (resolution_status == SlaStatus::Breached)
        .then(|| ticket.created_at + Duration::minutes(terms.resolution_time_minutes));

    let breached_at = match (response_breach, resolution_breach) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    let percentage_elapsed = if terms.resolution_time_minutes > 0 {
        (elapsed as f64 / terms.resolution_time_minutes as f64) * 100.0
    } else {
        0.0
    };

    SlaMetrics {
        response_time,
        resolution_time,
        first_response_at,
        response_status,
        resolution_status,
        breached_at,
        percentage_elapsed,
        time_remaining: Some(terms.resolution_time_minutes - elapsed),
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> Timestamp {
        t0() + Duration::minutes(minutes)
    }

    fn ticket() -> TicketSnapshot {
        TicketSnapshot {
            status: "new".to_string(),
            created_at: t0(),
            updated_at: t0(),
            resolved_at: None,
            reporter_id: Some(Uuid::new_v4()),
            assignee_id: None,
        }
    }

    fn terms(response: i64, resolution: i64) -> SlaTerms {
        SlaTerms {
            response_time_minutes: response,
            resolution_time_minutes: resolution,
        }
    }

    #[test]
    fn test_no_policy_collapses_to_no_sla() {
        let metrics = compute_sla_metrics(&ticket(), None, &[], at(500));

        assert_eq!(metrics.response_status, SlaStatus::NoSla);
        assert_eq!(metrics.resolution_status, SlaStatus::NoSla);
        assert_eq!(metrics.response_time, None);
        assert_eq!(metrics.resolution_time, None);
        assert_eq!(metrics.breached_at, None);
        assert_eq!(metrics.time_remaining, None);
        assert_eq!(metrics.percentage_elapsed, 0.0);
    }

    #[test]
    fn test_pending_threshold_bands() {
        let policy = terms(100, 100);

        // Below 80% of the threshold: on-track.
        let m = compute_sla_metrics(&ticket(), Some(&policy), &[], at(79));
        assert_eq!(m.resolution_status, SlaStatus::OnTrack);

        // Exactly at 80%: at-risk.
        let m = compute_sla_metrics(&ticket(), Some(&policy), &[], at(80));
        assert_eq!(m.resolution_status, SlaStatus::AtRisk);

        // At the threshold: breached.
        let m = compute_sla_metrics(&ticket(), Some(&policy), &[], at(100));
        assert_eq!(m.resolution_status, SlaStatus::Breached);
        assert_eq!(m.breached_at, Some(at(100)));
        assert_eq!(m.time_remaining, Some(0));
    }

    #[test]
    fn test_idempotent_for_fixed_now() {
        let policy = terms(30, 240);
        let comments = vec![CommentSnapshot {
            author_id: Some(Uuid::new_v4()),
            is_internal: false,
            created_at: at(10),
        }];

        let a = compute_sla_metrics(&ticket(), Some(&policy), &comments, at(120));
        let b = compute_sla_metrics(&ticket(), Some(&policy), &comments, at(120));
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_response_from_staff_comment() {
        let ticket = ticket();
        let comments = vec![CommentSnapshot {
            author_id: Some(Uuid::new_v4()),
            is_internal: false,
            created_at: at(15),
        }];

        let m = compute_sla_metrics(&ticket, Some(&terms(30, 240)), &comments, at(20));
        assert_eq!(m.first_response_at, Some(at(15)));
        assert_eq!(m.response_time, Some(15));
        assert_eq!(m.response_status, SlaStatus::Met);
    }

    #[test]
    fn test_reporter_and_internal_comments_are_not_responses() {
        let ticket = ticket();
        let comments = vec![
            // The reporter commenting on their own ticket.
            CommentSnapshot {
                author_id: ticket.reporter_id,
                is_internal: false,
                created_at: at(5),
            },
            // A staff note not visible to the reporter.
            CommentSnapshot {
                author_id: Some(Uuid::new_v4()),
                is_internal: true,
                created_at: at(8),
            },
        ];

        let m = compute_sla_metrics(&ticket, Some(&terms(30, 240)), &comments, at(20));
        assert_eq!(m.first_response_at, None);
        assert_eq!(m.response_status, SlaStatus::OnTrack);
    }

    #[test]
    fn test_in_progress_status_takes_precedence_over_comments() {
        let mut ticket = ticket();
        ticket.status = STATUS_IN_PROGRESS.to_string();
        ticket.updated_at = at(3);

        let comments = vec![CommentSnapshot {
            author_id: Some(Uuid::new_v4()),
            is_internal: false,
            created_at: at(15),
        }];

        let m = compute_sla_metrics(&ticket, Some(&terms(30, 240)), &comments, at(20));
        assert_eq!(m.first_response_at, Some(at(3)));
        assert_eq!(m.response_time, Some(3));
    }

    #[test]
    fn test_assignment_counts_as_response() {
        // Policy 30m response / 240m resolution; assignee set at T0+5m.
        let mut ticket = ticket();
        ticket.assignee_id = Some(Uuid::new_v4());
        ticket.updated_at = at(5);

        let m = compute_sla_metrics(&ticket, Some(&terms(30, 240)), &[], at(200));
        assert_eq!(m.first_response_at, Some(at(5)));
        assert_eq!(m.response_status, SlaStatus::Met);

        // 200/240 = 83.3% elapsed: resolution is at risk.
        assert_eq!(m.resolution_status, SlaStatus::AtRisk);
        assert!((m.percentage_elapsed - 83.333).abs() < 0.01);
        assert_eq!(m.time_remaining, Some(40));
    }

    #[test]
    fn test_late_resolution_is_breached_with_breach_instant() {
        let mut ticket = ticket();
        ticket.resolved_at = Some(at(300));
        ticket.assignee_id = Some(Uuid::new_v4());
        ticket.updated_at = at(5);

        let m = compute_sla_metrics(&ticket, Some(&terms(30, 240)), &[], at(310));
        assert_eq!(m.resolution_time, Some(300));
        assert_eq!(m.resolution_status, SlaStatus::Breached);
        assert_eq!(m.breached_at, Some(at(240)));
    }

    #[test]
    fn test_double_breach_takes_earliest_instant() {
        // No response, unresolved, way past both thresholds.
        let m = compute_sla_metrics(&ticket(), Some(&terms(30, 240)), &[], at(500));
        assert_eq!(m.response_status, SlaStatus::Breached);
        assert_eq!(m.resolution_status, SlaStatus::Breached);
        assert_eq!(m.breached_at, Some(at(30)));
        assert_eq!(m.time_remaining, Some(-260));
    }

    #[test]
    fn test_fractional_minutes_truncate_toward_zero() {
        let a = t0();
        let b = t0() + Duration::seconds(119);
        assert_eq!(minutes_between(a, b), 1);

        let c = t0() + Duration::milliseconds(59_999);
        assert_eq!(minutes_between(a, c), 0);
    }
}
