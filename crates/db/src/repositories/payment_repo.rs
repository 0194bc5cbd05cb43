//! Repository for the `payments` table.
//!
//! Payment rows are created and updated only by the reconciliation and
//! refund-approval flows; the unique `tid` index is the idempotence
//! anchor for gateway redelivery.

use sqlx::{PgConnection, PgPool};
use swimdesk_core::types::{Amount, DbId};

use crate::models::payment::{NewPayment, Payment};
use crate::models::status::{PaymentStatus, StatusId};

/// Column list for `payments` queries.
const COLUMNS: &str = "\
    id, enrollment_id, tid, paid_amount, lesson_amount, locker_amount, \
    refunded_amount, status_id, result_code, result_message, pay_method, \
    paid_at, created_at, updated_at";

/// Provides persistence operations for gateway payments.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Find a payment by its external transaction id.
    pub async fn find_by_tid(
        conn: &mut PgConnection,
        tid: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE tid = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(tid)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find the enrollment's live (paid or partially refunded) payment,
    /// locking it for the enclosing transaction.
    pub async fn find_live_by_enrollment_for_update(
        conn: &mut PgConnection,
        enrollment_id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE enrollment_id = $1 AND status_id IN ($2, $3) \
             ORDER BY created_at DESC \
             LIMIT 1 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(enrollment_id)
            .bind(PaymentStatus::Paid.id())
            .bind(PaymentStatus::PartialRefunded.id())
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find the enrollment's most recent payment of any status.
    pub async fn find_latest_by_enrollment(
        pool: &PgPool,
        enrollment_id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE enrollment_id = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(enrollment_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new payment record.
    pub async fn insert(
        conn: &mut PgConnection,
        payment: &NewPayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments \
                 (enrollment_id, tid, paid_amount, lesson_amount, locker_amount, \
                  status_id, result_code, result_message, pay_method, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(payment.enrollment_id)
            .bind(&payment.tid)
            .bind(payment.paid_amount)
            .bind(payment.lesson_amount)
            .bind(payment.locker_amount)
            .bind(payment.status_id)
            .bind(&payment.result_code)
            .bind(&payment.result_message)
            .bind(&payment.pay_method)
            .bind(payment.paid_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Increase the refunded amount and move the payment to the given
    /// status. The CHECK constraint rejects refunds beyond the paid
    /// amount.
    pub async fn apply_refund(
        conn: &mut PgConnection,
        payment_id: DbId,
        additional_refund: Amount,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE payments \
             SET refunded_amount = refunded_amount + $2, status_id = $3, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(payment_id)
        .bind(additional_refund)
        .bind(status_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
