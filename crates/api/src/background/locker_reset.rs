//! Monthly zeroing of locker usage counters.
//!
//! Locker capacity is a per-period resource, not cumulative: on the
//! first day of each month every category's used count returns to zero.
//! The task ticks hourly and fires once per calendar month; the reset
//! itself is idempotent, so a restart on day one cannot do harm.

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use swimdesk_core::clock::Clock;
use swimdesk_db::repositories::LockerRepo;
use swimdesk_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often the task checks whether the monthly reset is due.
const CHECK_INTERVAL: Duration = Duration::from_secs(3600); // hourly

/// Run the monthly-reset loop until `cancel` is triggered.
pub async fn run(pool: DbPool, clock: Arc<dyn Clock>, cancel: CancellationToken) {
    tracing::info!(
        check_interval_secs = CHECK_INTERVAL.as_secs(),
        "Locker-reset scheduler started"
    );

    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    let mut last_reset_month: Option<(i32, u32)> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Locker-reset scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                let today = clock.today();
                let month = (today.year(), today.month());
                if today.day() != 1 || last_reset_month == Some(month) {
                    continue;
                }
                match LockerRepo::reset_all_used(&pool).await {
                    Ok(reset) => {
                        last_reset_month = Some(month);
                        tracing::info!(
                            categories_reset = reset,
                            "Monthly locker usage reset applied"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Monthly locker reset failed");
                    }
                }
            }
        }
    }
}
