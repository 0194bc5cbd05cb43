//! Cancellation-request state machine.
//!
//! The id values match the `cancel_statuses` seed data (1-based SMALLINT).
//! The mapping is intentionally duplicated from the `db` crate's
//! `CancelStatus` enum because `core` must have zero internal deps.

use crate::error::CoreError;

/// Cancel-status id for "no request filed".
pub const CANCEL_NONE: i16 = 1;
/// Cancel-status id for a filed request awaiting review.
pub const CANCEL_REQ: i16 = 2;
/// Cancel-status id for a request whose automated refund could not
/// complete and needs manual follow-up.
pub const CANCEL_PENDING: i16 = 3;
/// Terminal: request approved, refund applied.
pub const CANCEL_APPROVED: i16 = 4;
/// Terminal: request denied.
pub const CANCEL_DENIED: i16 = 5;

/// Returns the set of valid target status ids reachable from `from`.
///
/// Terminal states (Approved, Denied) return an empty slice because no
/// further transitions are allowed.
pub fn valid_transitions(from: i16) -> &'static [i16] {
    match from {
        // None -> Req
        CANCEL_NONE => &[CANCEL_REQ],
        // Req -> Pending, Approved, Denied
        CANCEL_REQ => &[CANCEL_PENDING, CANCEL_APPROVED, CANCEL_DENIED],
        // Pending -> Approved, Denied
        CANCEL_PENDING => &[CANCEL_APPROVED, CANCEL_DENIED],
        // Terminal states
        CANCEL_APPROVED | CANCEL_DENIED => &[],
        // Unknown status: no transitions allowed
        _ => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: i16, to: i16) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a transition, producing the named domain error on violation.
pub fn validate_transition(from: i16, to: i16) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: status_name(from),
            to: status_name(to),
        })
    }
}

/// Human-readable name for a cancel-status id.
pub fn status_name(id: i16) -> &'static str {
    match id {
        CANCEL_NONE => "None",
        CANCEL_REQ => "Req",
        CANCEL_PENDING => "Pending",
        CANCEL_APPROVED => "Approved",
        CANCEL_DENIED => "Denied",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn none_to_req() {
        assert!(can_transition(CANCEL_NONE, CANCEL_REQ));
    }

    #[test]
    fn req_to_approved() {
        assert!(can_transition(CANCEL_REQ, CANCEL_APPROVED));
    }

    #[test]
    fn req_to_denied() {
        assert!(can_transition(CANCEL_REQ, CANCEL_DENIED));
    }

    #[test]
    fn req_to_pending() {
        assert!(can_transition(CANCEL_REQ, CANCEL_PENDING));
    }

    #[test]
    fn pending_to_approved() {
        assert!(can_transition(CANCEL_PENDING, CANCEL_APPROVED));
    }

    #[test]
    fn pending_to_denied() {
        assert!(can_transition(CANCEL_PENDING, CANCEL_DENIED));
    }

    // -----------------------------------------------------------------------
    // Terminal states have no outgoing transitions
    // -----------------------------------------------------------------------

    #[test]
    fn approved_has_no_transitions() {
        assert!(valid_transitions(CANCEL_APPROVED).is_empty());
    }

    #[test]
    fn denied_has_no_transitions() {
        assert!(valid_transitions(CANCEL_DENIED).is_empty());
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn none_cannot_jump_to_approved() {
        assert!(!can_transition(CANCEL_NONE, CANCEL_APPROVED));
    }

    #[test]
    fn none_cannot_jump_to_denied() {
        assert!(!can_transition(CANCEL_NONE, CANCEL_DENIED));
    }

    #[test]
    fn denied_cannot_reopen() {
        assert!(!can_transition(CANCEL_DENIED, CANCEL_REQ));
    }

    #[test]
    fn approved_cannot_become_denied() {
        assert!(!can_transition(CANCEL_APPROVED, CANCEL_DENIED));
    }

    #[test]
    fn pending_cannot_return_to_req() {
        assert!(!can_transition(CANCEL_PENDING, CANCEL_REQ));
    }

    #[test]
    fn unknown_status_has_no_transitions() {
        assert!(valid_transitions(99).is_empty());
    }

    // -----------------------------------------------------------------------
    // validate_transition error shape
    // -----------------------------------------------------------------------

    #[test]
    fn validate_transition_ok() {
        assert!(validate_transition(CANCEL_REQ, CANCEL_APPROVED).is_ok());
    }

    #[test]
    fn validate_transition_names_both_states() {
        assert_matches!(
            validate_transition(CANCEL_APPROVED, CANCEL_DENIED),
            Err(CoreError::InvalidTransition {
                from: "Approved",
                to: "Denied"
            })
        );
    }
}
