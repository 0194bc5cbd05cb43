//! Prorated refund calculation under the day-rate policy.
//!
//! [`calculate`] is a pure function: it never touches storage, so admin
//! preview can call it repeatedly with different overrides before the
//! approval flow commits a breakdown.

use chrono::NaiveDate;

use crate::types::Amount;

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// Deduction per elapsed usage day, in KRW.
pub const DEFAULT_DAILY_RATE: Amount = 3_500;

/// Locker fee assumed when a payment has no recorded lesson/locker split.
pub const DEFAULT_ASSUMED_LOCKER_FEE: Amount = 5_000;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Everything the engine needs, gathered by the caller.
#[derive(Debug, Clone)]
pub struct RefundInputs {
    /// First day of the lesson.
    pub lesson_start: NaiveDate,
    /// Total amount the user paid.
    pub paid_amount: Amount,
    /// Recorded lesson portion of the payment, when the reconciliation
    /// service was able to split it.
    pub lesson_amount: Option<Amount>,
    /// Recorded locker portion of the payment (reported, never refunded).
    pub locker_amount: Amount,
    /// Deduction per usage day.
    pub daily_rate: Amount,
    /// Locker fee assumed when no split was recorded.
    pub assumed_locker_fee: Amount,
    /// Admin override of the usage-day count. Negative values are ignored.
    pub manual_days_override: Option<i32>,
    /// Date the refund is computed as of.
    pub as_of: NaiveDate,
}

/// Deterministic refund breakdown.
///
/// Carries both the system-computed and the effective day counts so admin
/// UIs can show the override delta.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RefundBreakdown {
    pub paid_lesson_amount: Amount,
    pub locker_amount: Amount,
    pub system_days_used: i32,
    pub effective_days_used: i32,
    pub daily_rate: Amount,
    pub usage_deduction: Amount,
    pub refundable: Amount,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute the refundable amount for a paid enrollment.
///
/// - the lesson portion falls back to `paid - assumed_locker_fee` when no
///   split was recorded;
/// - days used count from the lesson start, inclusive, and never go
///   negative;
/// - the result is clamped to `[0, paid_lesson_amount]`.
pub fn calculate(inputs: &RefundInputs) -> RefundBreakdown {
    let paid_lesson_amount = inputs
        .lesson_amount
        .unwrap_or_else(|| (inputs.paid_amount - inputs.assumed_locker_fee).max(0));

    let system_days_used = (inputs.as_of - inputs.lesson_start).num_days() as i32 + 1;
    let system_days_used = system_days_used.max(0);

    let effective_days_used = match inputs.manual_days_override {
        Some(days) if days >= 0 => days,
        _ => system_days_used,
    };

    let usage_deduction = inputs.daily_rate * Amount::from(effective_days_used);
    let refundable = (paid_lesson_amount - usage_deduction).clamp(0, paid_lesson_amount);

    RefundBreakdown {
        paid_lesson_amount,
        locker_amount: inputs.locker_amount,
        system_days_used,
        effective_days_used,
        daily_rate: inputs.daily_rate,
        usage_deduction,
        refundable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn inputs() -> RefundInputs {
        RefundInputs {
            lesson_start: d(2026, 3, 1),
            paid_amount: 40_000,
            lesson_amount: Some(35_000),
            locker_amount: 5_000,
            daily_rate: DEFAULT_DAILY_RATE,
            assumed_locker_fee: DEFAULT_ASSUMED_LOCKER_FEE,
            manual_days_override: None,
            as_of: d(2026, 3, 10),
        }
    }

    // -----------------------------------------------------------------------
    // Proration boundaries
    // -----------------------------------------------------------------------

    #[test]
    fn ten_days_at_3500_consumes_35000() {
        let breakdown = calculate(&RefundInputs {
            manual_days_override: Some(10),
            ..inputs()
        });
        assert_eq!(breakdown.usage_deduction, 35_000);
        assert_eq!(breakdown.refundable, 0);
    }

    #[test]
    fn zero_days_refunds_full_lesson_amount() {
        let breakdown = calculate(&RefundInputs {
            manual_days_override: Some(0),
            ..inputs()
        });
        assert_eq!(breakdown.refundable, 35_000);
    }

    #[test]
    fn overconsumption_clamps_to_zero_not_negative() {
        let breakdown = calculate(&RefundInputs {
            manual_days_override: Some(15),
            ..inputs()
        });
        assert_eq!(breakdown.usage_deduction, 52_500);
        assert_eq!(breakdown.refundable, 0);
    }

    // -----------------------------------------------------------------------
    // Day counting
    // -----------------------------------------------------------------------

    #[test]
    fn system_days_are_inclusive_of_start_day() {
        // March 1 through March 10 is 10 usage days.
        let breakdown = calculate(&inputs());
        assert_eq!(breakdown.system_days_used, 10);
        assert_eq!(breakdown.effective_days_used, 10);
    }

    #[test]
    fn as_of_before_start_counts_zero_days() {
        let breakdown = calculate(&RefundInputs {
            as_of: d(2026, 2, 20),
            ..inputs()
        });
        assert_eq!(breakdown.system_days_used, 0);
        assert_eq!(breakdown.refundable, 35_000);
    }

    #[test]
    fn as_of_on_start_day_counts_one_day() {
        let breakdown = calculate(&RefundInputs {
            as_of: d(2026, 3, 1),
            ..inputs()
        });
        assert_eq!(breakdown.system_days_used, 1);
        assert_eq!(breakdown.refundable, 31_500);
    }

    // -----------------------------------------------------------------------
    // Override handling
    // -----------------------------------------------------------------------

    #[test]
    fn override_takes_precedence_over_system_days() {
        let breakdown = calculate(&RefundInputs {
            manual_days_override: Some(3),
            ..inputs()
        });
        assert_eq!(breakdown.system_days_used, 10);
        assert_eq!(breakdown.effective_days_used, 3);
        assert_eq!(breakdown.refundable, 35_000 - 3 * 3_500);
    }

    #[test]
    fn negative_override_is_ignored() {
        let breakdown = calculate(&RefundInputs {
            manual_days_override: Some(-4),
            ..inputs()
        });
        assert_eq!(breakdown.effective_days_used, 10);
    }

    // -----------------------------------------------------------------------
    // Lesson-portion fallback & locker policy
    // -----------------------------------------------------------------------

    #[test]
    fn missing_split_falls_back_to_paid_minus_assumed_fee() {
        let breakdown = calculate(&RefundInputs {
            lesson_amount: None,
            manual_days_override: Some(0),
            ..inputs()
        });
        assert_eq!(breakdown.paid_lesson_amount, 35_000);
        assert_eq!(breakdown.refundable, 35_000);
    }

    #[test]
    fn fallback_never_goes_negative() {
        let breakdown = calculate(&RefundInputs {
            lesson_amount: None,
            paid_amount: 3_000,
            manual_days_override: Some(0),
            ..inputs()
        });
        assert_eq!(breakdown.paid_lesson_amount, 0);
        assert_eq!(breakdown.refundable, 0);
    }

    #[test]
    fn locker_portion_is_reported_but_excluded() {
        let breakdown = calculate(&RefundInputs {
            manual_days_override: Some(0),
            ..inputs()
        });
        assert_eq!(breakdown.locker_amount, 5_000);
        // Refund covers the lesson portion only.
        assert_eq!(breakdown.refundable, 35_000);
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn identical_inputs_yield_identical_output() {
        let a = calculate(&inputs());
        let b = calculate(&inputs());
        assert_eq!(a, b);
    }

    #[test]
    fn preview_with_different_overrides_is_independent() {
        let base = inputs();
        let ten = calculate(&RefundInputs {
            manual_days_override: Some(10),
            ..base.clone()
        });
        let five = calculate(&RefundInputs {
            manual_days_override: Some(5),
            ..base.clone()
        });
        let ten_again = calculate(&RefundInputs {
            manual_days_override: Some(10),
            ..base
        });
        assert_eq!(ten, ten_again);
        assert!(five.refundable > ten.refundable);
    }
}
