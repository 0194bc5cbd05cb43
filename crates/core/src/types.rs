//! Shared primitive type aliases.

use chrono::{DateTime, Utc};

/// Database row identifier matching BIGSERIAL/BIGINT columns.
pub type DbId = i64;

/// UTC timestamp matching TIMESTAMPTZ columns.
pub type Timestamp = DateTime<Utc>;

/// Integer currency amount in minor units (KRW has no subunit).
pub type Amount = i64;
