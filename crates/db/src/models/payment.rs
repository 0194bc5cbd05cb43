//! Payment entity and the gateway notification payload.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use swimdesk_core::types::{Amount, DbId, Timestamp};

use super::status::StatusId;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub enrollment_id: DbId,
    /// External transaction id, globally unique.
    pub tid: String,
    pub paid_amount: Amount,
    pub lesson_amount: Option<Amount>,
    pub locker_amount: Amount,
    pub refunded_amount: Amount,
    pub status_id: StatusId,
    pub result_code: String,
    pub result_message: Option<String>,
    pub pay_method: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Column values for inserting a new payment record.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub enrollment_id: DbId,
    pub tid: String,
    pub paid_amount: Amount,
    pub lesson_amount: Option<Amount>,
    pub locker_amount: Amount,
    pub status_id: StatusId,
    pub result_code: String,
    pub result_message: Option<String>,
    pub pay_method: Option<String>,
    pub paid_at: Option<Timestamp>,
}

/// Asynchronous notification delivered by the external payment gateway.
///
/// Arrives form-encoded or as JSON; field names are part of the gateway
/// contract.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayNotification {
    /// External transaction id.
    pub tid: String,
    /// Order reference; encodes the enrollment id.
    pub order_ref: String,
    /// Gateway result code; `"0000"` means success.
    pub result_code: String,
    pub result_message: Option<String>,
    pub amount: Amount,
    pub pay_method: Option<String>,
}
