//! Repository for the `lessons` table.
//!
//! The admission flow locks the lesson row for the duration of its
//! capacity check; everything else is plain reads plus the open/closed
//! status flip.

use sqlx::{PgConnection, PgPool};
use swimdesk_core::types::DbId;

use crate::models::lesson::Lesson;
use crate::models::status::LessonStatus;

/// Column list for `lessons` queries.
const COLUMNS: &str = "\
    id, title, capacity, price, start_date, end_date, register_end_date, \
    status_id, created_at, updated_at";

/// Provides read and status operations for lessons.
pub struct LessonRepo;

impl LessonRepo {
    /// Find a lesson by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lesson>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lessons WHERE id = $1");
        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a lesson by its ID from inside a transaction, without
    /// locking. Reconciliation reads the lesson this way to keep its lock
    /// ordering disjoint from the admission path.
    pub async fn find_by_id_tx(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Lesson>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lessons WHERE id = $1");
        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a lesson by its ID, acquiring a row write-lock for the
    /// remainder of the enclosing transaction.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Lesson>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lessons WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Set a lesson's lifecycle status.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: LessonStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE lessons SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.id())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
