//! Releases lockers whose lesson has ended.
//!
//! Runs daily. Each release decrements the category counter and clears
//! the enrollment's allocation fields in one transaction per row, so a
//! failure mid-sweep leaves no half-released locker.

use std::sync::Arc;
use std::time::Duration;

use swimdesk_core::clock::Clock;
use swimdesk_db::repositories::EnrollmentRepo;
use swimdesk_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::services::locker;

/// How often the release sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(86_400); // daily

/// Run the locker-release sweep loop until `cancel` is triggered.
pub async fn run(pool: DbPool, clock: Arc<dyn Clock>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Locker-release sweeper started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Locker-release sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(&pool, clock.as_ref()).await;
            }
        }
    }
}

async fn sweep(pool: &DbPool, clock: &dyn Clock) {
    let allocations = match EnrollmentRepo::allocations_for_ended_lessons(pool, clock.today()).await
    {
        Ok(allocations) => allocations,
        Err(e) => {
            tracing::error!(error = %e, "Locker-release sweep query failed");
            return;
        }
    };

    if allocations.is_empty() {
        tracing::debug!("Locker-release sweep: nothing to release");
        return;
    }

    let mut released = 0usize;
    for allocation in &allocations {
        match release_one(pool, allocation.enrollment_id, &allocation.category).await {
            Ok(()) => released += 1,
            Err(e) => {
                tracing::error!(
                    enrollment_id = allocation.enrollment_id,
                    category = %allocation.category,
                    error = %e,
                    "Locker release failed for enrollment",
                );
            }
        }
    }

    tracing::info!(
        released,
        total = allocations.len(),
        "Locker-release sweep finished"
    );
}

async fn release_one(
    pool: &DbPool,
    enrollment_id: i64,
    category: &str,
) -> Result<(), crate::error::AppError> {
    let mut tx = pool.begin().await?;
    locker::decrement(&mut tx, category).await?;
    EnrollmentRepo::clear_locker_allocation(&mut tx, enrollment_id).await?;
    tx.commit().await?;
    Ok(())
}
