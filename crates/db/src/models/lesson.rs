//! Lesson entity and occupancy summary.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use swimdesk_core::types::{Amount, DbId, Timestamp};

use super::status::StatusId;

/// A row from the `lessons` table.
///
/// Owned by the lesson-management collaborator; the admission flow reads
/// it (with a row lock during the capacity check) and may flip its status
/// from open to closed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lesson {
    pub id: DbId,
    pub title: String,
    pub capacity: i32,
    pub price: Amount,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub register_end_date: Option<NaiveDate>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Live occupancy of a lesson: paid seats plus unexpired unpaid holds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LessonOccupancy {
    pub paid: i64,
    pub held: i64,
}

impl LessonOccupancy {
    /// Seats still available against the given capacity.
    pub fn available(&self, capacity: i32) -> i64 {
        i64::from(capacity) - self.paid - self.held
    }

    /// Whether occupancy meets or exceeds capacity.
    pub fn is_full(&self, capacity: i32) -> bool {
        self.available(capacity) <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_subtracts_paid_and_held() {
        let occ = LessonOccupancy { paid: 3, held: 2 };
        assert_eq!(occ.available(10), 5);
        assert!(!occ.is_full(10));
    }

    #[test]
    fn full_at_exact_capacity() {
        let occ = LessonOccupancy { paid: 8, held: 2 };
        assert!(occ.is_full(10));
        assert_eq!(occ.available(10), 0);
    }

    #[test]
    fn oversold_reports_negative_available() {
        let occ = LessonOccupancy { paid: 11, held: 0 };
        assert_eq!(occ.available(10), -1);
        assert!(occ.is_full(10));
    }
}
