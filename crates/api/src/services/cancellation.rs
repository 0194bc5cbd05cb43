//! Cancellation flow: member requests, refund preview, admin
//! approve/deny, and direct admin cancel.
//!
//! Money math is delegated to the pure refund engine; state changes go
//! through the cancel-status state machine so invalid transitions are
//! rejected before any row is touched.

use serde::Serialize;
use swimdesk_core::cancel;
use swimdesk_core::clock::Clock;
use swimdesk_core::error::CoreError;
use swimdesk_core::refund::{calculate, RefundBreakdown, RefundInputs};
use swimdesk_core::types::DbId;
use swimdesk_db::models::enrollment::Enrollment;
use swimdesk_db::models::status::{EnrollmentStatus, PaymentStatus, PayStatus};
use swimdesk_db::repositories::{EnrollmentRepo, LessonRepo, PaymentRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::services::locker;
use crate::state::AppState;

/// Outcome of an approval attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    /// Refund applied; the committed breakdown is attached.
    Approved { breakdown: RefundBreakdown },
    /// No live payment could be refunded automatically; the request was
    /// parked for manual follow-up.
    PendingManualRefund,
}

/// Member-initiated cancellation.
///
/// Unpaid holds cancel immediately; paid enrollments move into the
/// refund-request flow for admin review.
pub async fn request(
    state: &AppState,
    enrollment_id: DbId,
    user_id: DbId,
) -> AppResult<Enrollment> {
    let mut tx = state.pool.begin().await?;

    let enrollment = EnrollmentRepo::find_by_id_for_update(&mut tx, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;

    if enrollment.user_id != user_id {
        return Err(CoreError::Validation(
            "enrollment does not belong to the requesting user".into(),
        )
        .into());
    }
    if enrollment.status_id != EnrollmentStatus::Applied.id() {
        return Err(CoreError::Conflict(
            "enrollment cannot be canceled in its current state".into(),
        )
        .into());
    }

    if enrollment.pay_status_id == PayStatus::Unpaid.id() {
        EnrollmentRepo::cancel_unpaid(&mut tx, enrollment_id).await?;
    } else if enrollment.pay_status_id == PayStatus::Paid.id() {
        cancel::validate_transition(enrollment.cancel_status_id, cancel::CANCEL_REQ)?;
        EnrollmentRepo::apply_cancel_request(&mut tx, enrollment_id).await?;
    } else {
        return Err(CoreError::Conflict(
            "enrollment is not in a cancellable payment state".into(),
        )
        .into());
    }

    tx.commit().await?;

    let updated = EnrollmentRepo::find_by_id(&state.pool, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;

    tracing::info!(
        enrollment_id,
        user_id,
        cancel_status = cancel::status_name(updated.cancel_status_id),
        "Cancellation requested",
    );
    Ok(updated)
}

/// Compute a refund preview without committing anything.
///
/// Safe to call repeatedly with different overrides; the engine is pure.
pub async fn preview(
    state: &AppState,
    enrollment_id: DbId,
    days_override: Option<i32>,
) -> AppResult<RefundBreakdown> {
    let enrollment = EnrollmentRepo::find_by_id(&state.pool, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;
    let lesson = LessonRepo::find_by_id(&state.pool, enrollment.lesson_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Lesson",
            id: enrollment.lesson_id,
        })?;
    let payment = PaymentRepo::find_latest_by_enrollment(&state.pool, enrollment_id)
        .await?
        .filter(|p| {
            p.status_id == PaymentStatus::Paid.id()
                || p.status_id == PaymentStatus::PartialRefunded.id()
        })
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "enrollment has no refundable payment".into(),
            ))
        })?;

    Ok(calculate(&RefundInputs {
        lesson_start: lesson.start_date,
        paid_amount: payment.paid_amount,
        lesson_amount: payment.lesson_amount,
        locker_amount: payment.locker_amount,
        daily_rate: state.config.refund_daily_rate,
        assumed_locker_fee: state.config.assumed_locker_fee(),
        manual_days_override: days_override.or(enrollment.days_used_override),
        as_of: state.clock.today(),
    }))
}

/// Approve a cancellation request and execute the refund.
pub async fn approve(
    state: &AppState,
    enrollment_id: DbId,
    days_override: Option<i32>,
) -> AppResult<ApprovalOutcome> {
    let mut tx = state.pool.begin().await?;

    let enrollment = EnrollmentRepo::find_by_id_for_update(&mut tx, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;
    cancel::validate_transition(enrollment.cancel_status_id, cancel::CANCEL_APPROVED)?;

    let lesson = LessonRepo::find_by_id_tx(&mut tx, enrollment.lesson_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Lesson",
            id: enrollment.lesson_id,
        })?;

    let Some(payment) =
        PaymentRepo::find_live_by_enrollment_for_update(&mut tx, enrollment_id).await?
    else {
        // Automated refund cannot complete; park for manual follow-up.
        EnrollmentRepo::mark_refund_pending(&mut tx, enrollment_id).await?;
        tx.commit().await?;
        tracing::warn!(
            enrollment_id,
            "Approval found no live payment; request parked for manual refund",
        );
        return Ok(ApprovalOutcome::PendingManualRefund);
    };

    let breakdown = calculate(&RefundInputs {
        lesson_start: lesson.start_date,
        paid_amount: payment.paid_amount,
        lesson_amount: payment.lesson_amount,
        locker_amount: payment.locker_amount,
        daily_rate: state.config.refund_daily_rate,
        assumed_locker_fee: state.config.assumed_locker_fee(),
        manual_days_override: days_override.or(enrollment.days_used_override),
        as_of: state.clock.today(),
    });

    let enrollment_pay_status = if breakdown.refundable > 0 {
        let new_refunded = payment.refunded_amount + breakdown.refundable;
        let payment_status = if new_refunded >= payment.paid_amount {
            PaymentStatus::Canceled
        } else {
            PaymentStatus::PartialRefunded
        };
        PaymentRepo::apply_refund(&mut tx, payment.id, breakdown.refundable, payment_status.id())
            .await?;

        if new_refunded >= payment.paid_amount {
            PayStatus::Refunded
        } else {
            PayStatus::PartiallyRefunded
        }
    } else {
        // Usage consumed the full lesson portion; nothing to pay back.
        PayStatus::Paid
    };

    EnrollmentRepo::approve_cancel(
        &mut tx,
        enrollment_id,
        enrollment_pay_status,
        breakdown.refundable,
        breakdown.effective_days_used,
    )
    .await?;

    if enrollment.locker_allocated {
        if let Some(user) = UserRepo::find_by_id_tx(&mut tx, enrollment.user_id).await? {
            locker::decrement(&mut tx, &user.gender).await?;
        }
        EnrollmentRepo::clear_locker_allocation(&mut tx, enrollment_id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        enrollment_id,
        refundable = breakdown.refundable,
        effective_days = breakdown.effective_days_used,
        "Cancellation approved and refund applied",
    );
    Ok(ApprovalOutcome::Approved { breakdown })
}

/// Deny a cancellation request. No financial or locker side effects; the
/// enrollment returns to its active paid state.
pub async fn deny(state: &AppState, enrollment_id: DbId) -> AppResult<Enrollment> {
    let mut tx = state.pool.begin().await?;

    let enrollment = EnrollmentRepo::find_by_id_for_update(&mut tx, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;
    cancel::validate_transition(enrollment.cancel_status_id, cancel::CANCEL_DENIED)?;

    EnrollmentRepo::deny_cancel(&mut tx, enrollment_id).await?;
    tx.commit().await?;

    let updated = EnrollmentRepo::find_by_id(&state.pool, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;

    tracing::info!(enrollment_id, "Cancellation denied");
    Ok(updated)
}

/// Direct admin cancel: bypasses the request/approve flow, sets the
/// terminal state, and releases any allocated locker. Refunds, if owed,
/// follow the manual flow.
pub async fn admin_cancel(state: &AppState, enrollment_id: DbId) -> AppResult<Enrollment> {
    let mut tx = state.pool.begin().await?;

    let enrollment = EnrollmentRepo::find_by_id_for_update(&mut tx, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;

    let terminal = [
        EnrollmentStatus::Canceled.id(),
        EnrollmentStatus::CanceledByAdmin.id(),
        EnrollmentStatus::Expired.id(),
    ];
    if terminal.contains(&enrollment.status_id) {
        return Err(CoreError::Conflict("enrollment is already canceled".into()).into());
    }

    EnrollmentRepo::admin_cancel(&mut tx, enrollment_id).await?;

    if enrollment.locker_allocated {
        if let Some(user) = UserRepo::find_by_id_tx(&mut tx, enrollment.user_id).await? {
            locker::decrement(&mut tx, &user.gender).await?;
        }
        EnrollmentRepo::clear_locker_allocation(&mut tx, enrollment_id).await?;
    }

    tx.commit().await?;

    let updated = EnrollmentRepo::find_by_id(&state.pool, enrollment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;

    tracing::info!(enrollment_id, "Enrollment canceled by admin");
    Ok(updated)
}
