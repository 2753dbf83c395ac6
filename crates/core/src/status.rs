//! Ticket status vocabulary, priority/type constants, and the status-flow
//! policy table.
//!
//! The six-state lifecycle below is authoritative. The four-value vocabulary
//! some screens use (`open`, `in_progress`, `resolved`, `closed`) is a
//! display-only projection; see [`display_status`].

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Ticket has been created and not yet picked up.
pub const STATUS_NEW: &str = "new";

/// Ticket is being actively worked.
pub const STATUS_IN_PROGRESS: &str = "in_progress";

/// Work is paused; hold time is excluded from the resolution clock.
pub const STATUS_ON_HOLD: &str = "on_hold";

/// Work is finished and awaiting review.
pub const STATUS_UNDER_REVIEW: &str = "under_review";

/// Ticket has been resolved; may still be reopened.
pub const STATUS_RESOLVED: &str = "resolved";

/// Terminal state. No further transitions are allowed.
pub const STATUS_CLOSED: &str = "closed";

/// All valid ticket status values.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_NEW,
    STATUS_IN_PROGRESS,
    STATUS_ON_HOLD,
    STATUS_UNDER_REVIEW,
    STATUS_RESOLVED,
    STATUS_CLOSED,
];

/// All valid ticket priority values.
pub const VALID_PRIORITIES: &[&str] = &["low", "medium", "high"];

/// All valid ticket type values.
pub const VALID_TICKET_TYPES: &[&str] = &["request", "incident"];

/* --------------------------------------------------------------------------
Status-flow policy table
-------------------------------------------------------------------------- */

/// Return the statuses a ticket may move to from `from`.
///
/// Unknown statuses get an empty slice; [`validate_transition`] reports them
/// as validation failures.
pub fn allowed_transitions(from: &str) -> &'static [&'static str] {
    match from {
        STATUS_NEW => &[STATUS_IN_PROGRESS],
        STATUS_IN_PROGRESS => &[STATUS_UNDER_REVIEW, STATUS_ON_HOLD],
        STATUS_ON_HOLD => &[STATUS_IN_PROGRESS],
        STATUS_UNDER_REVIEW => &[STATUS_IN_PROGRESS, STATUS_RESOLVED],
        // Reopening a resolved ticket puts it back in progress.
        STATUS_RESOLVED => &[STATUS_CLOSED, STATUS_IN_PROGRESS],
        STATUS_CLOSED => &[],
        _ => &[],
    }
}

/// Whether `status` is terminal (no transitions out).
pub fn is_terminal(status: &str) -> bool {
    status == STATUS_CLOSED
}

/// Validate that moving from `from` to `to` is allowed by the policy table.
pub fn validate_transition(from: &str, to: &str) -> Result<(), CoreError> {
    validate_status(from)?;
    validate_status(to)?;

    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Project the canonical six-state status down to the four-value display
/// vocabulary.
pub fn display_status(status: &str) -> &'static str {
    match status {
        STATUS_NEW => "open",
        STATUS_IN_PROGRESS | STATUS_ON_HOLD | STATUS_UNDER_REVIEW => "in_progress",
        STATUS_RESOLVED => "resolved",
        _ => "closed",
    }
}

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

/// Validate that a ticket status string is one of the accepted values.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid ticket status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

/// Validate that a priority string is one of the accepted values.
pub fn validate_priority(priority: &str) -> Result<(), CoreError> {
    if VALID_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid priority '{priority}'. Must be one of: {}",
            VALID_PRIORITIES.join(", ")
        )))
    }
}

/// Validate that a ticket type string is one of the accepted values.
pub fn validate_ticket_type(ticket_type: &str) -> Result<(), CoreError> {
    if VALID_TICKET_TYPES.contains(&ticket_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid ticket type '{ticket_type}'. Must be one of: {}",
            VALID_TICKET_TYPES.join(", ")
        )))
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_flow_table_matches_policy() {
        assert_eq!(allowed_transitions(STATUS_NEW), &[STATUS_IN_PROGRESS]);
        assert_eq!(
            allowed_transitions(STATUS_IN_PROGRESS),
            &[STATUS_UNDER_REVIEW, STATUS_ON_HOLD]
        );
        assert_eq!(allowed_transitions(STATUS_ON_HOLD), &[STATUS_IN_PROGRESS]);
        assert_eq!(
            allowed_transitions(STATUS_UNDER_REVIEW),
            &[STATUS_IN_PROGRESS, STATUS_RESOLVED]
        );
        assert_eq!(
            allowed_transitions(STATUS_RESOLVED),
            &[STATUS_CLOSED, STATUS_IN_PROGRESS]
        );
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(is_terminal(STATUS_CLOSED));
        assert!(allowed_transitions(STATUS_CLOSED).is_empty());
        assert_matches!(
            validate_transition(STATUS_CLOSED, STATUS_IN_PROGRESS),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn test_legal_transitions_accepted() {
        assert!(validate_transition(STATUS_NEW, STATUS_IN_PROGRESS).is_ok());
        assert!(validate_transition(STATUS_IN_PROGRESS, STATUS_ON_HOLD).is_ok());
        assert!(validate_transition(STATUS_UNDER_REVIEW, STATUS_RESOLVED).is_ok());
        assert!(validate_transition(STATUS_RESOLVED, STATUS_IN_PROGRESS).is_ok());
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let err = validate_transition(STATUS_NEW, STATUS_RESOLVED).unwrap_err();
        assert_matches!(err, CoreError::InvalidTransition { ref from, ref to }
            if from == STATUS_NEW && to == STATUS_RESOLVED);
    }

    #[test]
    fn test_unknown_status_rejected_as_validation_error() {
        assert_matches!(
            validate_transition("bogus", STATUS_IN_PROGRESS),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_transition(STATUS_NEW, "bogus"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn test_display_projection() {
        assert_eq!(display_status(STATUS_NEW), "open");
        assert_eq!(display_status(STATUS_IN_PROGRESS), "in_progress");
        assert_eq!(display_status(STATUS_ON_HOLD), "in_progress");
        assert_eq!(display_status(STATUS_UNDER_REVIEW), "in_progress");
        assert_eq!(display_status(STATUS_RESOLVED), "resolved");
        assert_eq!(display_status(STATUS_CLOSED), "closed");
    }

    #[test]
    fn test_priority_and_type_validation() {
        assert!(validate_priority("high").is_ok());
        assert!(validate_priority("urgent").is_err());
        assert!(validate_ticket_type("incident").is_ok());
        assert!(validate_ticket_type("question").is_err());
    }
}
