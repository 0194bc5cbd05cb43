//! Registration-window policy for new enrollments and renewals.
//!
//! Windows are defined relative to the lesson's start month:
//! - a lesson starting in the current month accepts new enrollments until
//!   the end of the month;
//! - a lesson starting next month accepts new enrollments from day 26;
//! - renewals into next month are accepted on days 20 through 25 only.

use chrono::{Datelike, NaiveDate};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Window boundaries
// ---------------------------------------------------------------------------

/// Day of month from which next-month lessons open for new enrollment.
pub const NEXT_MONTH_OPEN_DAY: u32 = 26;

/// First day of the renewal window for next-month lessons.
pub const RENEWAL_OPEN_DAY: u32 = 20;

/// Last day of the renewal window for next-month lessons.
pub const RENEWAL_CLOSE_DAY: u32 = 25;

/// Zero-based month counter since year 0, for comparing calendar months.
fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Whether two dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    month_index(a) == month_index(b)
}

/// Whether `date` falls in the calendar month immediately after `base`.
pub fn is_next_month(date: NaiveDate, base: NaiveDate) -> bool {
    month_index(date) == month_index(base) + 1
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).expect("day 1 always exists");
    let next_first = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
    .expect("first of month always exists");
    (first, next_first.pred_opt().expect("month has a last day"))
}

/// First and last day of the calendar month immediately before the one
/// containing `date`.
pub fn previous_month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_of_month = date.with_day(1).expect("day 1 always exists");
    let last_of_previous = first_of_month
        .pred_opt()
        .expect("a previous day always exists");
    month_bounds(last_of_previous)
}

// ---------------------------------------------------------------------------
// Window checks
// ---------------------------------------------------------------------------

/// Validate the new-enrollment window for a lesson starting on
/// `lesson_start`, as of `today`.
pub fn validate_new_enrollment_window(
    lesson_start: NaiveDate,
    today: NaiveDate,
) -> Result<(), CoreError> {
    if same_month(lesson_start, today) {
        return Ok(());
    }
    if is_next_month(lesson_start, today) {
        if today.day() >= NEXT_MONTH_OPEN_DAY {
            return Ok(());
        }
        return Err(CoreError::WindowClosed(format!(
            "enrollment for next month opens on day {NEXT_MONTH_OPEN_DAY}"
        )));
    }
    Err(CoreError::WindowClosed(
        "lesson is not enrollable in the current registration period".into(),
    ))
}

/// Validate the renewal window for a lesson starting on `lesson_start`,
/// as of `today`. Renewals always target the following month.
pub fn validate_renewal_window(
    lesson_start: NaiveDate,
    today: NaiveDate,
) -> Result<(), CoreError> {
    if !is_next_month(lesson_start, today) {
        return Err(CoreError::WindowClosed(
            "renewal is only available for next month's lessons".into(),
        ));
    }
    if (RENEWAL_OPEN_DAY..=RENEWAL_CLOSE_DAY).contains(&today.day()) {
        Ok(())
    } else {
        Err(CoreError::WindowClosed(format!(
            "renewal window is day {RENEWAL_OPEN_DAY} through {RENEWAL_CLOSE_DAY}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // -----------------------------------------------------------------------
    // New enrollment window
    // -----------------------------------------------------------------------

    #[test]
    fn current_month_lesson_open_all_month() {
        assert!(validate_new_enrollment_window(d(2026, 3, 2), d(2026, 3, 1)).is_ok());
        assert!(validate_new_enrollment_window(d(2026, 3, 2), d(2026, 3, 31)).is_ok());
    }

    #[test]
    fn next_month_lesson_opens_on_day_26() {
        assert!(validate_new_enrollment_window(d(2026, 4, 1), d(2026, 3, 26)).is_ok());
        assert!(validate_new_enrollment_window(d(2026, 4, 1), d(2026, 3, 31)).is_ok());
    }

    #[test]
    fn next_month_lesson_closed_before_day_26() {
        assert_matches!(
            validate_new_enrollment_window(d(2026, 4, 1), d(2026, 3, 25)),
            Err(CoreError::WindowClosed(_))
        );
    }

    #[test]
    fn lesson_two_months_out_is_closed() {
        assert_matches!(
            validate_new_enrollment_window(d(2026, 5, 1), d(2026, 3, 28)),
            Err(CoreError::WindowClosed(_))
        );
    }

    #[test]
    fn past_month_lesson_is_closed() {
        assert_matches!(
            validate_new_enrollment_window(d(2026, 2, 1), d(2026, 3, 5)),
            Err(CoreError::WindowClosed(_))
        );
    }

    #[test]
    fn year_boundary_december_to_january() {
        // December 26: January lessons open for new enrollment.
        assert!(validate_new_enrollment_window(d(2027, 1, 4), d(2026, 12, 26)).is_ok());
        assert_matches!(
            validate_new_enrollment_window(d(2027, 1, 4), d(2026, 12, 25)),
            Err(CoreError::WindowClosed(_))
        );
    }

    // -----------------------------------------------------------------------
    // Renewal window
    // -----------------------------------------------------------------------

    #[test]
    fn renewal_open_days_20_through_25() {
        assert!(validate_renewal_window(d(2026, 4, 1), d(2026, 3, 20)).is_ok());
        assert!(validate_renewal_window(d(2026, 4, 1), d(2026, 3, 23)).is_ok());
        assert!(validate_renewal_window(d(2026, 4, 1), d(2026, 3, 25)).is_ok());
    }

    #[test]
    fn renewal_closed_outside_window() {
        assert_matches!(
            validate_renewal_window(d(2026, 4, 1), d(2026, 3, 19)),
            Err(CoreError::WindowClosed(_))
        );
        assert_matches!(
            validate_renewal_window(d(2026, 4, 1), d(2026, 3, 26)),
            Err(CoreError::WindowClosed(_))
        );
    }

    #[test]
    fn renewal_requires_next_month_lesson() {
        // Same-month lesson cannot be a renewal target.
        assert_matches!(
            validate_renewal_window(d(2026, 3, 1), d(2026, 3, 22)),
            Err(CoreError::WindowClosed(_))
        );
    }

    #[test]
    fn renewal_across_year_boundary() {
        assert!(validate_renewal_window(d(2027, 1, 4), d(2026, 12, 22)).is_ok());
    }

    // -----------------------------------------------------------------------
    // Month helpers
    // -----------------------------------------------------------------------

    #[test]
    fn month_bounds_regular_month() {
        let (first, last) = month_bounds(d(2026, 4, 17));
        assert_eq!(first, d(2026, 4, 1));
        assert_eq!(last, d(2026, 4, 30));
    }

    #[test]
    fn month_bounds_december() {
        let (first, last) = month_bounds(d(2026, 12, 3));
        assert_eq!(first, d(2026, 12, 1));
        assert_eq!(last, d(2026, 12, 31));
    }

    #[test]
    fn month_bounds_leap_february() {
        let (_, last) = month_bounds(d(2028, 2, 10));
        assert_eq!(last, d(2028, 2, 29));
    }

    #[test]
    fn previous_month_bounds_regular_and_january() {
        assert_eq!(
            previous_month_bounds(d(2026, 4, 17)),
            (d(2026, 3, 1), d(2026, 3, 31))
        );
        assert_eq!(
            previous_month_bounds(d(2027, 1, 4)),
            (d(2026, 12, 1), d(2026, 12, 31))
        );
    }

    #[test]
    fn next_month_detection_across_year() {
        assert!(is_next_month(d(2027, 1, 15), d(2026, 12, 1)));
        assert!(!is_next_month(d(2027, 2, 15), d(2026, 12, 1)));
    }
}
