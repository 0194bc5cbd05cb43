//! Business services: the only code paths allowed to mutate enrollment,
//! payment, and locker state. Handlers and schedulers call in through
//! these contracts and never bypass the invariant checks.

pub mod admission;
pub mod cancellation;
pub mod locker;
pub mod reconciliation;
