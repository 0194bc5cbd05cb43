//! User entity consumed from the identity collaborator.
//!
//! This system only reads users; the `gender` column doubles as the
//! locker category key.

use serde::Serialize;
use sqlx::FromRow;
use swimdesk_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub display_name: String,
    /// Locker category key: `MALE` or `FEMALE`.
    pub gender: String,
    pub phone: Option<String>,
    pub created_at: Timestamp,
}
