//! In-process event distribution for the enrollment platform.
//!
//! The bus carries best-effort notifications (capacity changes, expiries)
//! to live-view subscribers. Publishing never blocks and never fails the
//! publishing transaction.

pub mod bus;

pub use bus::{EventBus, PlatformEvent};
