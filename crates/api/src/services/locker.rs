//! Locker inventory manager: a pure counted-resource primitive.
//!
//! Keeps per-category used/total counters consistent under concurrency by
//! re-checking the bounds under a `FOR UPDATE` row lock scoped to the
//! category, so two categories never block each other. This module has no
//! knowledge of enrollments; reconciliation, admin cancel, and the
//! sweepers all share it.

use sqlx::{PgConnection, PgPool};
use swimdesk_core::error::CoreError;
use swimdesk_db::models::locker::LockerAvailability;
use swimdesk_db::repositories::LockerRepo;

use crate::error::{AppError, AppResult};

/// Allocate one locker in `category`.
///
/// Fails with [`CoreError::LockerExhausted`] when the category is full or
/// has no inventory record; never clamps silently.
pub async fn increment(conn: &mut PgConnection, category: &str) -> AppResult<()> {
    let Some(inventory) = LockerRepo::find_for_update(conn, category).await? else {
        tracing::warn!(category, "Locker increment against unknown category");
        return Err(AppError::Core(CoreError::LockerExhausted {
            category: category.to_string(),
        }));
    };

    if inventory.used_quantity >= inventory.total_quantity {
        return Err(AppError::Core(CoreError::LockerExhausted {
            category: category.to_string(),
        }));
    }

    LockerRepo::set_used(conn, category, inventory.used_quantity + 1).await?;
    Ok(())
}

/// Release one locker in `category`.
///
/// Decrementing at zero (or against an unknown category) is a logged
/// no-op so release paths stay idempotent.
pub async fn decrement(conn: &mut PgConnection, category: &str) -> AppResult<()> {
    let Some(inventory) = LockerRepo::find_for_update(conn, category).await? else {
        tracing::warn!(category, "Locker decrement against unknown category");
        return Ok(());
    };

    if inventory.used_quantity == 0 {
        tracing::warn!(category, "Locker decrement at zero usage ignored");
        return Ok(());
    }

    LockerRepo::set_used(conn, category, inventory.used_quantity - 1).await?;
    Ok(())
}

/// Read-only availability for a category.
///
/// A missing inventory record reads as zero capacity with a warning
/// rather than an error.
pub async fn availability(pool: &PgPool, category: &str) -> AppResult<LockerAvailability> {
    match LockerRepo::find(pool, category).await? {
        Some(inventory) => Ok(LockerAvailability {
            category: inventory.category.clone(),
            available: inventory.available(),
            total: inventory.total_quantity,
        }),
        None => {
            tracing::warn!(category, "Availability query for unknown locker category");
            Ok(LockerAvailability {
                category: category.to_string(),
                available: 0,
                total: 0,
            })
        }
    }
}
