//! Admission controller: enrollment creation under capacity contention.
//!
//! The capacity check-and-insert is the system's principal contended
//! critical section. It runs in a SERIALIZABLE transaction that first
//! write-locks the lesson row, and the whole operation is wrapped in the
//! bounded-retry policy for contention-class failures only; business-rule
//! violations are terminal and propagate immediately.

use chrono::Duration;
use serde::Serialize;
use swimdesk_core::clock::Clock;
use swimdesk_core::error::CoreError;
use swimdesk_core::registration::{
    month_bounds, validate_new_enrollment_window, validate_renewal_window,
};
use swimdesk_core::retry::{with_retries, BackoffPolicy};
use swimdesk_core::types::DbId;
use swimdesk_db::models::enrollment::Enrollment;
use swimdesk_db::models::status::LessonStatus;
use swimdesk_db::repositories::{EnrollmentRepo, LessonRepo};
use swimdesk_events::{self as events, PlatformEvent};

use crate::error::{is_conflict_error, AppResult};
use crate::state::AppState;

/// How long an unpaid hold reserves its capacity slot.
const HOLD_TTL_MINUTES: i64 = 5;

/// Which admission variant is being performed.
#[derive(Debug, Clone, Copy)]
enum AdmissionKind {
    New,
    /// Renewal records the locker request; resolution happens later in
    /// the reconciliation transfer path.
    Renewal {
        wants_locker: bool,
    },
}

/// Result of a successful admission: the new hold plus the lesson's
/// occupancy after the insert.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentSnapshot {
    pub enrollment: Enrollment,
    pub paid_count: i64,
    pub held_count: i64,
    pub available: i64,
    pub lesson_closed: bool,
}

/// Create a new unpaid enrollment hold for `user_id` on `lesson_id`.
pub async fn create(
    state: &AppState,
    user_id: DbId,
    lesson_id: DbId,
    client_ip: Option<String>,
) -> AppResult<EnrollmentSnapshot> {
    admit_with_retries(state, user_id, lesson_id, AdmissionKind::New, client_ip).await
}

/// Create a renewal hold. Identical to [`create`] except for the
/// registration-window rule and the recorded locker request.
pub async fn renew(
    state: &AppState,
    user_id: DbId,
    lesson_id: DbId,
    wants_locker: bool,
    client_ip: Option<String>,
) -> AppResult<EnrollmentSnapshot> {
    admit_with_retries(
        state,
        user_id,
        lesson_id,
        AdmissionKind::Renewal { wants_locker },
        client_ip,
    )
    .await
}

async fn admit_with_retries(
    state: &AppState,
    user_id: DbId,
    lesson_id: DbId,
    kind: AdmissionKind,
    client_ip: Option<String>,
) -> AppResult<EnrollmentSnapshot> {
    let snapshot = with_retries(BackoffPolicy::conflicts(), is_conflict_error, || {
        admit(state, user_id, lesson_id, kind)
    })
    .await?;

    tracing::info!(
        enrollment_id = snapshot.enrollment.id,
        user_id,
        lesson_id,
        available = snapshot.available,
        lesson_closed = snapshot.lesson_closed,
        client_ip = client_ip.as_deref().unwrap_or("unknown"),
        "Enrollment hold created",
    );

    // Best-effort live-view notification; never fails the admission.
    state.event_bus.publish(
        PlatformEvent::new(events::bus::LESSON_CAPACITY_CHANGED)
            .with_source("lesson", lesson_id)
            .with_actor(user_id)
            .with_payload(serde_json::json!({
                "paid": snapshot.paid_count,
                "held": snapshot.held_count,
                "available": snapshot.available,
                "closed": snapshot.lesson_closed,
            })),
    );

    Ok(snapshot)
}

/// One admission attempt: the serializable check-and-insert.
async fn admit(
    state: &AppState,
    user_id: DbId,
    lesson_id: DbId,
    kind: AdmissionKind,
) -> AppResult<EnrollmentSnapshot> {
    let mut tx = state.pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;

    let lesson = LessonRepo::find_by_id_for_update(&mut tx, lesson_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Lesson",
            id: lesson_id,
        })?;

    if lesson.status_id != LessonStatus::Open.id() {
        return Err(CoreError::WindowClosed("lesson is not open for enrollment".into()).into());
    }

    let today = state.clock.today();
    match kind {
        AdmissionKind::New => validate_new_enrollment_window(lesson.start_date, today)?,
        AdmissionKind::Renewal { .. } => validate_renewal_window(lesson.start_date, today)?,
    }
    if let Some(register_end) = lesson.register_end_date {
        if today > register_end {
            return Err(
                CoreError::WindowClosed("lesson registration period has ended".into()).into(),
            );
        }
    }

    let now = state.clock.now();

    // Clear this user's own overdue hold first so the active-enrollment
    // unique index does not block a legitimate re-attempt.
    EnrollmentRepo::expire_stale_for_user_lesson(&mut tx, user_id, lesson_id, now).await?;

    if EnrollmentRepo::exists_active(&mut tx, user_id, lesson_id, now).await? {
        return Err(CoreError::DuplicateEnrollment { user_id, lesson_id }.into());
    }

    let (month_start, month_end) = month_bounds(lesson.start_date);
    if EnrollmentRepo::exists_in_month(&mut tx, user_id, month_start, month_end, lesson_id, now)
        .await?
    {
        return Err(CoreError::MonthlyLimit { user_id }.into());
    }

    let occupancy = EnrollmentRepo::count_occupancy(&mut tx, lesson_id, now).await?;
    if occupancy.is_full(lesson.capacity) {
        return Err(CoreError::CapacityExhausted { lesson_id }.into());
    }

    let (renewal, uses_locker) = match kind {
        AdmissionKind::New => (false, false),
        AdmissionKind::Renewal { wants_locker } => (true, wants_locker),
    };
    let expires_at = now + Duration::minutes(HOLD_TTL_MINUTES);
    let enrollment =
        EnrollmentRepo::insert_hold(&mut tx, user_id, lesson_id, expires_at, renewal, uses_locker)
            .await?;

    // Recompute occupancy after the insert; close the lesson in the same
    // transaction when it just filled up.
    let occupancy = EnrollmentRepo::count_occupancy(&mut tx, lesson_id, now).await?;
    let lesson_closed = occupancy.is_full(lesson.capacity);
    if lesson_closed {
        LessonRepo::set_status(&mut tx, lesson_id, LessonStatus::Closed).await?;
    }

    tx.commit().await?;

    Ok(EnrollmentSnapshot {
        available: occupancy.available(lesson.capacity).max(0),
        paid_count: occupancy.paid,
        held_count: occupancy.held,
        lesson_closed,
        enrollment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_ttl_is_five_minutes() {
        assert_eq!(HOLD_TTL_MINUTES, 5);
    }
}
