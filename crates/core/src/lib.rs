//! Pure domain logic for the swimdesk enrollment platform.
//!
//! This crate has zero internal dependencies so it can be used by the
//! DB/repository layer, the API layer, and any future CLI tooling.

pub mod cancel;
pub mod clock;
pub mod error;
pub mod payment;
pub mod refund;
pub mod registration;
pub mod retry;
pub mod types;
