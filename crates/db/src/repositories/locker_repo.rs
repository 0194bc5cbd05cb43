//! Repository for the `locker_inventory` table.
//!
//! Counter mutations always go through a `FOR UPDATE` read of the
//! category row so concurrent allocations for one category serialize
//! while different categories proceed independently.

use sqlx::{PgConnection, PgPool};

use crate::models::locker::LockerInventory;

/// Column list for `locker_inventory` queries.
const COLUMNS: &str = "category, total_quantity, used_quantity, updated_at";

/// Provides counter operations for the locker inventory.
pub struct LockerRepo;

impl LockerRepo {
    /// Find a category's inventory row.
    pub async fn find(
        pool: &PgPool,
        category: &str,
    ) -> Result<Option<LockerInventory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locker_inventory WHERE category = $1");
        sqlx::query_as::<_, LockerInventory>(&query)
            .bind(category)
            .fetch_optional(pool)
            .await
    }

    /// Find a category's inventory row, locking it for the enclosing
    /// transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        category: &str,
    ) -> Result<Option<LockerInventory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locker_inventory WHERE category = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, LockerInventory>(&query)
            .bind(category)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Write a category's used count. Callers re-check the bounds under
    /// the row lock first; the CHECK constraint is the final guard.
    pub async fn set_used(
        conn: &mut PgConnection,
        category: &str,
        used: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE locker_inventory \
             SET used_quantity = $2, updated_at = NOW() \
             WHERE category = $1",
        )
        .bind(category)
        .bind(used)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// List all categories.
    pub async fn list(pool: &PgPool) -> Result<Vec<LockerInventory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locker_inventory ORDER BY category");
        sqlx::query_as::<_, LockerInventory>(&query)
            .fetch_all(pool)
            .await
    }

    /// Zero every category's used count (start-of-period reset).
    pub async fn reset_all_used(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE locker_inventory \
             SET used_quantity = 0, updated_at = NOW() \
             WHERE used_quantity <> 0",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
