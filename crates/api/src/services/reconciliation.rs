//! Payment reconciliation: applies gateway notifications to enrollments.
//!
//! This is the single source of truth for marking an enrollment paid.
//! Redelivery is expected, so processing is idempotent keyed on the
//! gateway transaction id. Every terminal outcome resolves to an explicit
//! [`Ack`]; only transient database failures (after the retry budget)
//! surface as errors, which the webhook handler turns into a non-2xx
//! response so the gateway redelivers.

use swimdesk_core::clock::Clock;
use swimdesk_core::payment::{parse_order_ref, split_amount, Ack, RESULT_CODE_SUCCESS};
use swimdesk_core::registration::previous_month_bounds;
use swimdesk_core::retry::{with_retries, BackoffPolicy};
use swimdesk_core::types::DbId;
use swimdesk_db::models::enrollment::Enrollment;
use swimdesk_db::models::payment::{GatewayNotification, NewPayment};
use swimdesk_db::models::status::{EnrollmentStatus, PaymentStatus, PayStatus};
use swimdesk_db::repositories::{EnrollmentRepo, LessonRepo, PaymentRepo, UserRepo};

use crate::error::{is_conflict_error, AppError, AppResult};
use crate::services::locker;
use crate::state::AppState;

/// Apply a gateway notification, returning the ack token to send back.
///
/// `Ok(Ack::Ok)` / `Ok(Ack::Fail)` are both terminal acknowledgments;
/// an `Err` means transient trouble and invites redelivery.
pub async fn handle_notification(
    state: &AppState,
    notification: &GatewayNotification,
) -> AppResult<Ack> {
    // Malformed order references fail closed without touching storage.
    let Some(enrollment_id) = parse_order_ref(&notification.order_ref) else {
        tracing::error!(
            tid = %notification.tid,
            order_ref = %notification.order_ref,
            "Gateway notification with malformed order reference",
        );
        return Ok(Ack::Fail);
    };

    with_retries(BackoffPolicy::conflicts(), is_conflict_error, || {
        reconcile(state, notification, enrollment_id)
    })
    .await
}

/// One reconciliation attempt inside its own transaction.
async fn reconcile(
    state: &AppState,
    notification: &GatewayNotification,
    enrollment_id: DbId,
) -> AppResult<Ack> {
    let mut tx = state.pool.begin().await?;

    // Idempotence gate: has this transaction id been seen before?
    if let Some(existing) = PaymentRepo::find_by_tid(&mut tx, &notification.tid).await? {
        if existing.enrollment_id == enrollment_id {
            let duplicate_paid = existing.status_id == PaymentStatus::Paid.id()
                && notification.result_code == RESULT_CODE_SUCCESS;
            let duplicate_failed = existing.status_id == PaymentStatus::Failed.id()
                && notification.result_code != RESULT_CODE_SUCCESS;
            if duplicate_paid || duplicate_failed {
                tracing::info!(
                    tid = %notification.tid,
                    enrollment_id,
                    "Duplicate gateway delivery acknowledged without reprocessing",
                );
                return Ok(Ack::Ok);
            }
        }
        // Transaction-id reuse across enrollments, or an inconsistent
        // replay. Fail closed; this needs manual investigation.
        tracing::error!(
            tid = %notification.tid,
            enrollment_id,
            existing_enrollment_id = existing.enrollment_id,
            existing_status_id = existing.status_id,
            result_code = %notification.result_code,
            "Gateway transaction id conflicts with an existing payment",
        );
        return Ok(Ack::Fail);
    }

    let Some(enrollment) = EnrollmentRepo::find_by_id_for_update(&mut tx, enrollment_id).await?
    else {
        tracing::error!(
            tid = %notification.tid,
            enrollment_id,
            "Gateway notification references an unknown enrollment",
        );
        return Ok(Ack::Fail);
    };

    if notification.result_code == RESULT_CODE_SUCCESS {
        // The tid gate above did not match, so a paid (or refund-state)
        // enrollment here means a second transaction id is claiming the
        // same enrollment. Cross-tid conflicts are integrity failures
        // and are never auto-resolved.
        let reconcilable = enrollment.pay_status_id == PayStatus::Unpaid.id()
            || enrollment.pay_status_id == PayStatus::Expired.id();
        if !reconcilable {
            tracing::error!(
                tid = %notification.tid,
                enrollment_id = enrollment.id,
                pay_status_id = enrollment.pay_status_id,
                "Success notification for an enrollment settled under another transaction",
            );
            return Ok(Ack::Fail);
        }

        apply_success(state, &mut tx, notification, &enrollment).await?;
        tx.commit().await?;
        Ok(Ack::Ok)
    } else {
        // Gateway-reported failure: keep an audit record and leave the
        // unpaid hold to the expiry sweeper.
        PaymentRepo::insert(
            &mut tx,
            &NewPayment {
                enrollment_id: enrollment.id,
                tid: notification.tid.clone(),
                paid_amount: 0,
                lesson_amount: None,
                locker_amount: 0,
                status_id: PaymentStatus::Failed.id(),
                result_code: notification.result_code.clone(),
                result_message: notification.result_message.clone(),
                pay_method: notification.pay_method.clone(),
                paid_at: None,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::warn!(
            tid = %notification.tid,
            enrollment_id = enrollment.id,
            result_code = %notification.result_code,
            "Gateway reported payment failure; recorded for audit",
        );
        Ok(Ack::Ok)
    }
}

/// Success branch: mark paid, resolve the locker, split the amount, and
/// persist the payment record.
async fn apply_success(
    state: &AppState,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    notification: &GatewayNotification,
    enrollment: &Enrollment,
) -> AppResult<()> {
    let lesson = LessonRepo::find_by_id_tx(tx, enrollment.lesson_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!(
                "enrollment {} references missing lesson {}",
                enrollment.id, enrollment.lesson_id
            ))
        })?;

    if enrollment.status_id == EnrollmentStatus::Expired.id() {
        tracing::warn!(
            enrollment_id = enrollment.id,
            "Payment confirmed for an already-expired hold; restoring enrollment",
        );
    }
    EnrollmentRepo::mark_paid(tx, enrollment.id).await?;

    resolve_locker(tx, notification, enrollment, lesson.start_date).await?;

    // Split the confirmed amount into lesson and locker portions.
    let split = split_amount(
        notification.amount,
        lesson.price,
        state.config.locker_fee,
        state.config.locker_fee_tolerance,
    );
    if !split.reconciled {
        tracing::warn!(
            tid = %notification.tid,
            enrollment_id = enrollment.id,
            amount = notification.amount,
            lesson_price = lesson.price,
            "Paid amount did not reconcile; attributed fully to the lesson portion",
        );
    }

    PaymentRepo::insert(
        tx,
        &NewPayment {
            enrollment_id: enrollment.id,
            tid: notification.tid.clone(),
            paid_amount: notification.amount,
            lesson_amount: Some(split.lesson_amount),
            locker_amount: split.locker_amount,
            status_id: PaymentStatus::Paid.id(),
            result_code: notification.result_code.clone(),
            result_message: notification.result_message.clone(),
            pay_method: notification.pay_method.clone(),
            paid_at: Some(state.clock.now()),
        },
    )
    .await?;

    tracing::info!(
        tid = %notification.tid,
        enrollment_id = enrollment.id,
        amount = notification.amount,
        "Payment reconciled",
    );
    Ok(())
}

/// Resolve the enrollment's locker state for a confirmed payment.
///
/// Renewals first try to transfer the previous period's allocation,
/// which conserves inventory counts. A locker shortfall never fails the
/// payment; the enrollment just stays unallocated.
async fn resolve_locker(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    notification: &GatewayNotification,
    enrollment: &Enrollment,
    lesson_start: chrono::NaiveDate,
) -> AppResult<()> {
    if enrollment.uses_locker {
        if enrollment.locker_allocated {
            return Ok(());
        }

        if enrollment.renewal {
            let (period_start, period_end) = previous_month_bounds(lesson_start);
            if let Some(previous) = EnrollmentRepo::find_transferable_previous(
                tx,
                enrollment.user_id,
                period_start,
                period_end,
            )
            .await?
            {
                // Transfer: move the allocation without touching the
                // inventory counters.
                EnrollmentRepo::clear_locker_allocation(tx, previous.id).await?;
                EnrollmentRepo::set_locker_allocation(tx, enrollment.id, &notification.tid)
                    .await?;
                tracing::info!(
                    enrollment_id = enrollment.id,
                    previous_enrollment_id = previous.id,
                    "Locker transferred from previous period",
                );
                return Ok(());
            }
        }

        let Some(user) = UserRepo::find_by_id_tx(tx, enrollment.user_id).await? else {
            tracing::warn!(
                enrollment_id = enrollment.id,
                user_id = enrollment.user_id,
                "Locker requested but user record is missing; continuing without locker",
            );
            return Ok(());
        };

        match locker::increment(tx, &user.gender).await {
            Ok(()) => {
                EnrollmentRepo::set_locker_allocation(tx, enrollment.id, &notification.tid)
                    .await?;
            }
            Err(AppError::Core(swimdesk_core::error::CoreError::LockerExhausted {
                category,
            })) => {
                tracing::warn!(
                    enrollment_id = enrollment.id,
                    category,
                    "No locker available; payment completes without allocation",
                );
            }
            Err(other) => return Err(other),
        }
        return Ok(());
    }

    if enrollment.locker_allocated {
        // A locker was allocated earlier but is no longer wanted.
        if let Some(user) = UserRepo::find_by_id_tx(tx, enrollment.user_id).await? {
            locker::decrement(tx, &user.gender).await?;
        }
        EnrollmentRepo::clear_locker_allocation(tx, enrollment.id).await?;
    }
    Ok(())
}
