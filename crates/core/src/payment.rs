//! Payment-gateway vocabulary and amount reconciliation.
//!
//! The ack tokens and the success result code are a fixed external
//! contract with the gateway; they are defined once here and never
//! redefined elsewhere.

use crate::types::{Amount, DbId};

// ---------------------------------------------------------------------------
// Gateway contract
// ---------------------------------------------------------------------------

/// Result code the gateway sends for a successful payment.
pub const RESULT_CODE_SUCCESS: &str = "0000";

/// Prefix of order references issued by this system.
pub const ORDER_REF_PREFIX: &str = "enr-";

/// Acknowledgment token returned to the gateway.
///
/// `Ok` and `Fail` are both terminal: the gateway stops redelivering
/// either way. Transient internal failures are signalled with a non-2xx
/// HTTP status instead, which the gateway treats as "retry later".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Ok,
    Fail,
}

impl Ack {
    /// The exact plain-text token the gateway expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Ack::Ok => "OK",
            Ack::Fail => "FAIL",
        }
    }
}

/// Build the order reference embedded in a payment request.
pub fn order_ref(enrollment_id: DbId) -> String {
    format!("{ORDER_REF_PREFIX}{enrollment_id}")
}

/// Parse the enrollment id out of an order reference.
///
/// Returns `None` on any malformed input; callers fail closed rather
/// than guessing.
pub fn parse_order_ref(order_ref: &str) -> Option<DbId> {
    let digits = order_ref.strip_prefix(ORDER_REF_PREFIX)?;
    if digits.is_empty() {
        return None;
    }
    let id: DbId = digits.parse().ok()?;
    if id > 0 {
        Some(id)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Amount splitting
// ---------------------------------------------------------------------------

/// Result of splitting a confirmed payment into lesson and locker portions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountSplit {
    pub lesson_amount: Amount,
    pub locker_amount: Amount,
    /// Whether the amounts reconciled within the tolerance band. When
    /// false, the full amount was attributed to the lesson portion.
    pub reconciled: bool,
}

/// Split `total` into lesson and locker portions.
///
/// The lesson portion is the lesson's price; the remainder counts as the
/// locker portion when it matches the configured locker fee within
/// `tolerance`. Anything else does not reconcile and the full amount is
/// attributed to the lesson portion.
pub fn split_amount(
    total: Amount,
    lesson_price: Amount,
    locker_fee: Amount,
    tolerance: Amount,
) -> AmountSplit {
    let remainder = total - lesson_price;

    if remainder == 0 {
        return AmountSplit {
            lesson_amount: lesson_price,
            locker_amount: 0,
            reconciled: true,
        };
    }

    if remainder > 0 && (remainder - locker_fee).abs() <= tolerance {
        return AmountSplit {
            lesson_amount: lesson_price,
            locker_amount: remainder,
            reconciled: true,
        };
    }

    AmountSplit {
        lesson_amount: total,
        locker_amount: 0,
        reconciled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Ack tokens
    // -----------------------------------------------------------------------

    #[test]
    fn ack_tokens_match_gateway_contract() {
        assert_eq!(Ack::Ok.as_str(), "OK");
        assert_eq!(Ack::Fail.as_str(), "FAIL");
    }

    // -----------------------------------------------------------------------
    // Order reference round trip
    // -----------------------------------------------------------------------

    #[test]
    fn order_ref_encodes_enrollment_id() {
        assert_eq!(order_ref(42), "enr-42");
    }

    #[test]
    fn parse_valid_order_ref() {
        assert_eq!(parse_order_ref("enr-42"), Some(42));
        assert_eq!(parse_order_ref("enr-9007199254"), Some(9_007_199_254));
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        assert_eq!(parse_order_ref("ord-42"), None);
        assert_eq!(parse_order_ref("42"), None);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_order_ref(""), None);
        assert_eq!(parse_order_ref("enr-"), None);
        assert_eq!(parse_order_ref("enr-abc"), None);
        assert_eq!(parse_order_ref("enr-12x"), None);
    }

    #[test]
    fn parse_rejects_non_positive_ids() {
        assert_eq!(parse_order_ref("enr-0"), None);
        assert_eq!(parse_order_ref("enr--5"), None);
    }

    // -----------------------------------------------------------------------
    // Amount splitting
    // -----------------------------------------------------------------------

    #[test]
    fn exact_lesson_price_has_no_locker_portion() {
        let split = split_amount(35_000, 35_000, 5_000, 1_000);
        assert_eq!(split.lesson_amount, 35_000);
        assert_eq!(split.locker_amount, 0);
        assert!(split.reconciled);
    }

    #[test]
    fn remainder_matching_locker_fee_reconciles() {
        let split = split_amount(40_000, 35_000, 5_000, 1_000);
        assert_eq!(split.lesson_amount, 35_000);
        assert_eq!(split.locker_amount, 5_000);
        assert!(split.reconciled);
    }

    #[test]
    fn remainder_within_tolerance_band_reconciles() {
        let split = split_amount(40_800, 35_000, 5_000, 1_000);
        assert_eq!(split.locker_amount, 5_800);
        assert!(split.reconciled);

        let split = split_amount(39_200, 35_000, 5_000, 1_000);
        assert_eq!(split.locker_amount, 4_200);
        assert!(split.reconciled);
    }

    #[test]
    fn remainder_outside_tolerance_attributes_all_to_lesson() {
        let split = split_amount(45_000, 35_000, 5_000, 1_000);
        assert_eq!(split.lesson_amount, 45_000);
        assert_eq!(split.locker_amount, 0);
        assert!(!split.reconciled);
    }

    #[test]
    fn underpayment_does_not_reconcile() {
        let split = split_amount(30_000, 35_000, 5_000, 1_000);
        assert_eq!(split.lesson_amount, 30_000);
        assert_eq!(split.locker_amount, 0);
        assert!(!split.reconciled);
    }

    #[test]
    fn zero_tolerance_requires_exact_fee() {
        assert!(split_amount(40_000, 35_000, 5_000, 0).reconciled);
        assert!(!split_amount(40_001, 35_000, 5_000, 0).reconciled);
    }
}
