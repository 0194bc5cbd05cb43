//! Enrollment entity and the DTOs used by the admission and admin flows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use swimdesk_core::types::{Amount, DbId, Timestamp};

use super::status::StatusId;

/// A row from the `enrollments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub lesson_id: DbId,
    pub status_id: StatusId,
    pub pay_status_id: StatusId,
    pub cancel_status_id: StatusId,
    /// Hold TTL; only meaningful while the enrollment is unpaid.
    pub expires_at: Option<Timestamp>,
    pub uses_locker: bool,
    pub locker_allocated: bool,
    /// Token correlating a locker allocation to a payment transaction.
    pub locker_pg_token: Option<String>,
    pub renewal: bool,
    pub days_used_override: Option<i32>,
    pub refund_amount: Option<Amount>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Query parameters for the admin enrollment listing.
#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentListQuery {
    pub lesson_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub pay_status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// A locker allocation joined with its category, as released by sweepers.
#[derive(Debug, Clone, FromRow)]
pub struct LockerAllocation {
    pub enrollment_id: DbId,
    pub category: String,
}

/// Per-category ground-truth allocation count used by the resync sweeper.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryUsage {
    pub category: String,
    pub allocated: i64,
}
