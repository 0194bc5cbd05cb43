//! Locker inventory entity.

use serde::Serialize;
use sqlx::FromRow;
use swimdesk_core::types::Timestamp;

/// A row from the `locker_inventory` table.
///
/// `0 <= used_quantity <= total_quantity` holds at all times; the CHECK
/// constraint backs up the application-level guard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LockerInventory {
    pub category: String,
    pub total_quantity: i32,
    pub used_quantity: i32,
    pub updated_at: Timestamp,
}

impl LockerInventory {
    /// Lockers still available in this category.
    pub fn available(&self) -> i32 {
        self.total_quantity - self.used_quantity
    }
}

/// Read-only availability snapshot returned by the availability query.
#[derive(Debug, Clone, Serialize)]
pub struct LockerAvailability {
    pub category: String,
    pub available: i32,
    pub total: i32,
}
