//! Hourly drift correction for locker usage counters.
//!
//! Recomputes each category's used count from ground truth (paid,
//! locker-allocated enrollments of lessons that have not ended) and
//! rewrites any counter that drifted. Categories with no eligible
//! enrollments reset to zero, so the sweep is idempotent and never
//! double counts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use swimdesk_core::clock::Clock;
use swimdesk_db::models::enrollment::CategoryUsage;
use swimdesk_db::models::locker::LockerInventory;
use swimdesk_db::repositories::{EnrollmentRepo, LockerRepo};
use swimdesk_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often the resync runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // hourly

/// A counter correction computed from ground truth.
#[derive(Debug, PartialEq, Eq)]
struct Correction {
    category: String,
    used: i32,
    /// True when ground truth exceeded the category total and the value
    /// was capped; this signals over-allocation and is logged loudly.
    capped: bool,
}

/// Run the resync loop until `cancel` is triggered.
pub async fn run(pool: DbPool, clock: Arc<dyn Clock>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Locker-resync sweeper started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Locker-resync sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(&pool, clock.as_ref()).await;
            }
        }
    }
}

async fn sweep(pool: &DbPool, clock: &dyn Clock) {
    let today = clock.today();

    let ground_truth = match EnrollmentRepo::ground_truth_usage(pool, today).await {
        Ok(usage) => usage,
        Err(e) => {
            tracing::error!(error = %e, "Locker-resync ground-truth query failed");
            return;
        }
    };
    let inventory = match LockerRepo::list(pool).await {
        Ok(inventory) => inventory,
        Err(e) => {
            tracing::error!(error = %e, "Locker-resync inventory query failed");
            return;
        }
    };

    let corrections = compute_corrections(&inventory, &ground_truth);
    if corrections.is_empty() {
        tracing::debug!("Locker-resync: counters already match ground truth");
        return;
    }

    for correction in &corrections {
        if correction.capped {
            tracing::error!(
                category = %correction.category,
                used = correction.used,
                "Ground truth exceeds locker total; over-allocation needs investigation",
            );
        }
        if let Err(e) = apply_correction(pool, correction).await {
            tracing::error!(
                category = %correction.category,
                error = %e,
                "Locker-resync correction failed",
            );
        } else {
            tracing::warn!(
                category = %correction.category,
                used = correction.used,
                "Locker counter drift corrected",
            );
        }
    }
}

/// Diff inventory counters against ground truth, capping at each
/// category's total.
fn compute_corrections(
    inventory: &[LockerInventory],
    ground_truth: &[CategoryUsage],
) -> Vec<Correction> {
    let counts: HashMap<&str, i64> = ground_truth
        .iter()
        .map(|usage| (usage.category.as_str(), usage.allocated))
        .collect();

    inventory
        .iter()
        .filter_map(|row| {
            let truth = counts.get(row.category.as_str()).copied().unwrap_or(0);
            let capped = truth > i64::from(row.total_quantity);
            let used = if capped {
                row.total_quantity
            } else {
                truth as i32
            };
            (used != row.used_quantity).then(|| Correction {
                category: row.category.clone(),
                used,
                capped,
            })
        })
        .collect()
}

async fn apply_correction(
    pool: &DbPool,
    correction: &Correction,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    // Lock the row so the write does not race a concurrent allocation.
    if LockerRepo::find_for_update(&mut tx, &correction.category)
        .await?
        .is_some()
    {
        LockerRepo::set_used(&mut tx, &correction.category, correction.used).await?;
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn inventory(category: &str, total: i32, used: i32) -> LockerInventory {
        LockerInventory {
            category: category.to_string(),
            total_quantity: total,
            used_quantity: used,
            updated_at: Utc::now(),
        }
    }

    fn usage(category: &str, allocated: i64) -> CategoryUsage {
        CategoryUsage {
            category: category.to_string(),
            allocated,
        }
    }

    #[test]
    fn matching_counters_need_no_correction() {
        let corrections = compute_corrections(
            &[inventory("MALE", 30, 4), inventory("FEMALE", 30, 2)],
            &[usage("MALE", 4), usage("FEMALE", 2)],
        );
        assert!(corrections.is_empty());
    }

    #[test]
    fn drifted_counter_is_corrected() {
        let corrections = compute_corrections(
            &[inventory("MALE", 30, 7)],
            &[usage("MALE", 4)],
        );
        assert_eq!(
            corrections,
            vec![Correction {
                category: "MALE".into(),
                used: 4,
                capped: false
            }]
        );
    }

    #[test]
    fn category_with_no_eligible_users_resets_to_zero() {
        let corrections = compute_corrections(&[inventory("FEMALE", 30, 5)], &[]);
        assert_eq!(
            corrections,
            vec![Correction {
                category: "FEMALE".into(),
                used: 0,
                capped: false
            }]
        );
    }

    #[test]
    fn ground_truth_above_total_is_capped_and_flagged() {
        let corrections = compute_corrections(
            &[inventory("MALE", 10, 8)],
            &[usage("MALE", 12)],
        );
        assert_eq!(
            corrections,
            vec![Correction {
                category: "MALE".into(),
                used: 10,
                capped: true
            }]
        );
    }

    #[test]
    fn counter_already_at_cap_is_left_alone() {
        let corrections = compute_corrections(
            &[inventory("MALE", 10, 10)],
            &[usage("MALE", 12)],
        );
        assert!(corrections.is_empty());
    }

    #[test]
    fn unknown_ground_truth_category_is_ignored() {
        // Ground truth mentions a category with no inventory row; there
        // is nothing to correct.
        let corrections = compute_corrections(
            &[inventory("MALE", 30, 0)],
            &[usage("UNKNOWN", 3)],
        );
        assert!(corrections.is_empty());
    }
}
