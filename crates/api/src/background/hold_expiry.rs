//! Expires overdue unpaid holds so their capacity slots free up.
//!
//! Runs every 5 minutes. Each expired hold also triggers a best-effort
//! capacity-change notification so live views converge without polling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use swimdesk_core::clock::Clock;
use swimdesk_db::repositories::EnrollmentRepo;
use swimdesk_db::DbPool;
use swimdesk_events::{self as events, EventBus, PlatformEvent};
use tokio_util::sync::CancellationToken;

/// How often the expiry sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the hold-expiry sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    event_bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Hold-expiry sweeper started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Hold-expiry sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(&pool, &event_bus, clock.as_ref()).await;
            }
        }
    }
}

async fn sweep(pool: &DbPool, event_bus: &EventBus, clock: &dyn Clock) {
    match EnrollmentRepo::expire_overdue(pool, clock.now()).await {
        Ok(expired) if expired.is_empty() => {
            tracing::debug!("Hold-expiry sweep: nothing to expire");
        }
        Ok(expired) => {
            tracing::info!(count = expired.len(), "Hold-expiry sweep: expired overdue holds");

            // One capacity notification per affected lesson.
            let mut per_lesson: HashMap<i64, i64> = HashMap::new();
            for (enrollment_id, lesson_id) in &expired {
                *per_lesson.entry(*lesson_id).or_insert(0) += 1;
                event_bus.publish(
                    PlatformEvent::new(events::bus::ENROLLMENT_EXPIRED)
                        .with_source("enrollment", *enrollment_id),
                );
            }
            for (lesson_id, freed) in per_lesson {
                event_bus.publish(
                    PlatformEvent::new(events::bus::LESSON_CAPACITY_CHANGED)
                        .with_source("lesson", lesson_id)
                        .with_payload(serde_json::json!({ "freed": freed })),
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Hold-expiry sweep failed");
        }
    }
}
