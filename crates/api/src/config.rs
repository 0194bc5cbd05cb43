use swimdesk_core::refund::{DEFAULT_ASSUMED_LOCKER_FEE, DEFAULT_DAILY_RATE};
use swimdesk_core::types::Amount;

/// Default locker fee charged on top of the lesson price, in KRW.
const DEFAULT_LOCKER_FEE: Amount = 5_000;

/// Default tolerance band when reconciling the locker portion, in KRW.
const DEFAULT_LOCKER_FEE_TOLERANCE: Amount = 1_000;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Remote IPs allowed to call the gateway webhook. Empty means no
    /// filtering (development).
    pub gateway_allowed_ips: Vec<String>,
    /// Locker fee expected on top of the lesson price.
    pub locker_fee: Amount,
    /// Tolerance band for reconciling the locker portion of a payment.
    pub locker_fee_tolerance: Amount,
    /// Refund deduction per elapsed usage day.
    pub refund_daily_rate: Amount,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `GATEWAY_ALLOWED_IPS`   | (empty, no filtering)   |
    /// | `LOCKER_FEE`            | `5000`                  |
    /// | `LOCKER_FEE_TOLERANCE`  | `1000`                  |
    /// | `REFUND_DAILY_RATE`     | `3500`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let gateway_allowed_ips: Vec<String> = std::env::var("GATEWAY_ALLOWED_IPS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let locker_fee: Amount = std::env::var("LOCKER_FEE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOCKER_FEE);

        let locker_fee_tolerance: Amount = std::env::var("LOCKER_FEE_TOLERANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOCKER_FEE_TOLERANCE);

        let refund_daily_rate: Amount = std::env::var("REFUND_DAILY_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DAILY_RATE);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            gateway_allowed_ips,
            locker_fee,
            locker_fee_tolerance,
            refund_daily_rate,
        }
    }

    /// Locker fee assumed by the refund engine when a payment carries no
    /// recorded split.
    pub fn assumed_locker_fee(&self) -> Amount {
        if self.locker_fee > 0 {
            self.locker_fee
        } else {
            DEFAULT_ASSUMED_LOCKER_FEE
        }
    }
}
