//! Repository for the `enrollments` table.
//!
//! All status mutations go through named methods that move the row to an
//! explicit combination of lifecycle/pay/cancel statuses; callers never
//! write raw status ids.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use swimdesk_core::types::{Amount, DbId, Timestamp};

use crate::models::enrollment::{
    CategoryUsage, Enrollment, EnrollmentListQuery, LockerAllocation,
};
use crate::models::lesson::LessonOccupancy;
use crate::models::status::{CancelStatus, EnrollmentStatus, PayStatus};

/// Column list for `enrollments` queries.
const COLUMNS: &str = "\
    id, user_id, lesson_id, status_id, pay_status_id, cancel_status_id, \
    expires_at, uses_locker, locker_allocated, locker_pg_token, renewal, \
    days_used_override, refund_amount, created_at, updated_at";

/// Maximum page size for enrollment listings.
const MAX_LIMIT: i64 = 200;

/// Default page size for enrollment listings.
const DEFAULT_LIMIT: i64 = 50;

/// Provides CRUD and status-transition operations for enrollments.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Find an enrollment by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an enrollment by its ID, locking the row for the enclosing
    /// transaction.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Count a lesson's live occupancy: paid enrollments plus unpaid
    /// holds whose TTL has not yet elapsed.
    pub async fn count_occupancy(
        conn: &mut PgConnection,
        lesson_id: DbId,
        now: Timestamp,
    ) -> Result<LessonOccupancy, sqlx::Error> {
        let (paid, held): (i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*) FILTER (WHERE pay_status_id = $2), \
                 COUNT(*) FILTER (WHERE pay_status_id = $3 AND expires_at > $4) \
             FROM enrollments \
             WHERE lesson_id = $1 AND status_id = $5",
        )
        .bind(lesson_id)
        .bind(PayStatus::Paid.id())
        .bind(PayStatus::Unpaid.id())
        .bind(now)
        .bind(EnrollmentStatus::Applied.id())
        .fetch_one(&mut *conn)
        .await?;
        Ok(LessonOccupancy { paid, held })
    }

    /// Whether the user already holds a paid or live-unpaid enrollment
    /// for this lesson.
    pub async fn exists_active(
        conn: &mut PgConnection,
        user_id: DbId,
        lesson_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM enrollments \
                 WHERE user_id = $1 AND lesson_id = $2 AND status_id = $3 \
                   AND (pay_status_id = $4 \
                        OR (pay_status_id = $5 AND expires_at > $6)) \
             )",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(EnrollmentStatus::Applied.id())
        .bind(PayStatus::Paid.id())
        .bind(PayStatus::Unpaid.id())
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists.0)
    }

    /// Whether the user holds an active enrollment for any *other* lesson
    /// starting inside the given month (one lesson per user per month).
    pub async fn exists_in_month(
        conn: &mut PgConnection,
        user_id: DbId,
        month_start: NaiveDate,
        month_end: NaiveDate,
        exclude_lesson_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM enrollments e \
                 JOIN lessons l ON l.id = e.lesson_id \
                 WHERE e.user_id = $1 \
                   AND e.lesson_id <> $2 \
                   AND e.status_id = $3 \
                   AND (e.pay_status_id = $4 \
                        OR (e.pay_status_id = $5 AND e.expires_at > $6)) \
                   AND l.start_date BETWEEN $7 AND $8 \
             )",
        )
        .bind(user_id)
        .bind(exclude_lesson_id)
        .bind(EnrollmentStatus::Applied.id())
        .bind(PayStatus::Paid.id())
        .bind(PayStatus::Unpaid.id())
        .bind(now)
        .bind(month_start)
        .bind(month_end)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists.0)
    }

    /// Expire this user's overdue unpaid holds for the lesson so a fresh
    /// hold does not trip the active-enrollment unique index.
    pub async fn expire_stale_for_user_lesson(
        conn: &mut PgConnection,
        user_id: DbId,
        lesson_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE enrollments \
             SET status_id = $4, pay_status_id = $5, updated_at = NOW() \
             WHERE user_id = $1 AND lesson_id = $2 \
               AND status_id = $3 AND pay_status_id = $6 \
               AND expires_at <= $7",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(EnrollmentStatus::Applied.id())
        .bind(EnrollmentStatus::Expired.id())
        .bind(PayStatus::Expired.id())
        .bind(PayStatus::Unpaid.id())
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert a new unpaid hold.
    pub async fn insert_hold(
        conn: &mut PgConnection,
        user_id: DbId,
        lesson_id: DbId,
        expires_at: Timestamp,
        renewal: bool,
        uses_locker: bool,
    ) -> Result<Enrollment, sqlx::Error> {
        let query = format!(
            "INSERT INTO enrollments \
                 (user_id, lesson_id, status_id, pay_status_id, cancel_status_id, \
                  expires_at, renewal, uses_locker) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .bind(lesson_id)
            .bind(EnrollmentStatus::Applied.id())
            .bind(PayStatus::Unpaid.id())
            .bind(CancelStatus::None.id())
            .bind(expires_at)
            .bind(renewal)
            .bind(uses_locker)
            .fetch_one(&mut *conn)
            .await
    }

    /// Mark an enrollment paid. Restores lifecycle status to applied in
    /// case the hold was swept between payment and notification.
    pub async fn mark_paid(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET pay_status_id = $2, status_id = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(PayStatus::Paid.id())
        .bind(EnrollmentStatus::Applied.id())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Record a locker allocation together with its payment token.
    pub async fn set_locker_allocation(
        conn: &mut PgConnection,
        id: DbId,
        pg_token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET locker_allocated = TRUE, locker_pg_token = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(pg_token)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Clear a locker allocation.
    pub async fn clear_locker_allocation(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET locker_allocated = FALSE, locker_pg_token = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Find the user's most recent paid, locker-allocated enrollment for
    /// a lesson starting inside the given (previous) period.
    pub async fn find_transferable_previous(
        conn: &mut PgConnection,
        user_id: DbId,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT e.{} FROM enrollments e \
             JOIN lessons l ON l.id = e.lesson_id \
             WHERE e.user_id = $1 \
               AND e.pay_status_id = $2 \
               AND e.locker_allocated \
               AND l.start_date BETWEEN $3 AND $4 \
             ORDER BY e.created_at DESC \
             LIMIT 1 \
             FOR UPDATE OF e",
            COLUMNS.replace(", ", ", e.")
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .bind(PayStatus::Paid.id())
            .bind(period_start)
            .bind(period_end)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Move a paid enrollment into the cancellation-requested state.
    pub async fn apply_cancel_request(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET status_id = $2, pay_status_id = $3, cancel_status_id = $4, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(EnrollmentStatus::CanceledReq.id())
        .bind(PayStatus::RefundRequested.id())
        .bind(CancelStatus::Req.id())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Cancel an unpaid hold outright (no refund involved).
    pub async fn cancel_unpaid(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments SET status_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(EnrollmentStatus::Canceled.id())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Apply an approved refund: terminal cancel state plus the committed
    /// day count and refund amount.
    pub async fn approve_cancel(
        conn: &mut PgConnection,
        id: DbId,
        pay_status: PayStatus,
        refund_amount: Amount,
        days_used: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET status_id = $2, pay_status_id = $3, cancel_status_id = $4, \
                 refund_amount = $5, days_used_override = $6, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(EnrollmentStatus::Canceled.id())
        .bind(pay_status.id())
        .bind(CancelStatus::Approved.id())
        .bind(refund_amount)
        .bind(days_used)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Park a cancellation whose automated refund could not complete.
    pub async fn mark_refund_pending(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET pay_status_id = $2, cancel_status_id = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(PayStatus::RefundPendingAdminCancel.id())
        .bind(CancelStatus::Pending.id())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Deny a cancellation request, restoring the active paid state.
    pub async fn deny_cancel(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments \
             SET status_id = $2, pay_status_id = $3, cancel_status_id = $4, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(EnrollmentStatus::Applied.id())
        .bind(PayStatus::Paid.id())
        .bind(CancelStatus::Denied.id())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Terminal admin cancel, bypassing the request/approve flow.
    pub async fn admin_cancel(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE enrollments SET status_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(EnrollmentStatus::CanceledByAdmin.id())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// List a user's own enrollments, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Admin listing with optional lesson/user/pay-status filters and
    /// pagination.
    pub async fn list(
        pool: &PgPool,
        params: &EnrollmentListQuery,
    ) -> Result<Vec<Enrollment>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.lesson_id.is_some() {
            conditions.push(format!("lesson_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.user_id.is_some() {
            conditions.push(format!("user_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.pay_status_id.is_some() {
            conditions.push(format!("pay_status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM enrollments \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Enrollment>(&query);

        if let Some(lid) = params.lesson_id {
            q = q.bind(lid);
        }
        if let Some(uid) = params.user_id {
            q = q.bind(uid);
        }
        if let Some(sid) = params.pay_status_id {
            q = q.bind(sid);
        }

        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// List open cancellation requests (requested or pending manual
    /// follow-up), oldest first.
    pub async fn list_cancel_requests(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments \
             WHERE cancel_status_id IN ($1, $2) \
             ORDER BY updated_at ASC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(CancelStatus::Req.id())
            .bind(CancelStatus::Pending.id())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Expire every overdue unpaid hold, returning `(enrollment_id,
    /// lesson_id)` pairs so the sweeper can publish capacity changes.
    pub async fn expire_overdue(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<(DbId, DbId)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE enrollments \
             SET status_id = $1, pay_status_id = $2, updated_at = NOW() \
             WHERE status_id = $3 AND pay_status_id = $4 AND expires_at <= $5 \
             RETURNING id, lesson_id",
        )
        .bind(EnrollmentStatus::Expired.id())
        .bind(PayStatus::Expired.id())
        .bind(EnrollmentStatus::Applied.id())
        .bind(PayStatus::Unpaid.id())
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Locker allocations whose lesson has already ended, joined with the
    /// holder's category.
    pub async fn allocations_for_ended_lessons(
        pool: &PgPool,
        today: NaiveDate,
    ) -> Result<Vec<LockerAllocation>, sqlx::Error> {
        sqlx::query_as::<_, LockerAllocation>(
            "SELECT e.id AS enrollment_id, u.gender AS category \
             FROM enrollments e \
             JOIN lessons l ON l.id = e.lesson_id \
             JOIN users u ON u.id = e.user_id \
             WHERE e.locker_allocated AND l.end_date < $1",
        )
        .bind(today)
        .fetch_all(pool)
        .await
    }

    /// Ground-truth locker usage: paid, allocated enrollments of lessons
    /// that have not ended, grouped by the holder's category.
    pub async fn ground_truth_usage(
        pool: &PgPool,
        today: NaiveDate,
    ) -> Result<Vec<CategoryUsage>, sqlx::Error> {
        sqlx::query_as::<_, CategoryUsage>(
            "SELECT u.gender AS category, COUNT(*) AS allocated \
             FROM enrollments e \
             JOIN lessons l ON l.id = e.lesson_id \
             JOIN users u ON u.id = e.user_id \
             WHERE e.locker_allocated AND e.pay_status_id = $1 AND l.end_date >= $2 \
             GROUP BY u.gender",
        )
        .bind(PayStatus::Paid.id())
        .bind(today)
        .fetch_all(pool)
        .await
    }
}
