//! Background tasks and scheduled sweepers.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks accept a [`CancellationToken`]
//! for graceful shutdown.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod hold_expiry;
pub mod locker_release;
pub mod locker_reset;
pub mod locker_resync;
