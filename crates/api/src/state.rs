use std::sync::Arc;

use swimdesk_core::clock::Clock;
use swimdesk_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: swimdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Best-effort capacity-change notification channel.
    pub event_bus: Arc<EventBus>,
    /// Time source; injected so admission windows and hold TTLs are
    /// testable.
    pub clock: Arc<dyn Clock>,
}
