use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use swimdesk_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `swimdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Postgres SQLSTATE codes in the contention class: serialization
/// failure, deadlock detected, lock not available.
const CONFLICT_SQLSTATES: [&str; 3] = ["40001", "40P01", "55P03"];

/// Whether an error belongs to the retryable contention class.
///
/// Only these failures are eligible for the bounded-retry policy;
/// business-rule violations and every other error are terminal.
pub fn is_conflict_error(err: &AppError) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => db_err
            .code()
            .is_some_and(|code| CONFLICT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::CapacityExhausted { .. } => (
                    StatusCode::CONFLICT,
                    "CAPACITY_EXHAUSTED",
                    core.to_string(),
                ),
                CoreError::DuplicateEnrollment { .. } => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_ENROLLMENT",
                    core.to_string(),
                ),
                CoreError::WindowClosed(msg) => {
                    (StatusCode::CONFLICT, "WINDOW_CLOSED", msg.clone())
                }
                CoreError::MonthlyLimit { .. } => {
                    (StatusCode::CONFLICT, "MONTHLY_LIMIT", core.to_string())
                }
                CoreError::LockerExhausted { .. } => {
                    (StatusCode::CONFLICT, "LOCKER_EXHAUSTED", core.to_string())
                }
                CoreError::InvalidTransition { .. } => (
                    StatusCode::CONFLICT,
                    "INVALID_TRANSITION",
                    core.to_string(),
                ),
                CoreError::IntegrityViolation(msg) => {
                    tracing::error!(error = %msg, "Data integrity violation");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTEGRITY_VIOLATION",
                        "A data integrity problem requires manual investigation".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Contention-class errors map to 503 after the retry budget is spent.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            if db_err
                .code()
                .is_some_and(|code| CONFLICT_SQLSTATES.contains(&code.as_ref()))
            {
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "TRANSIENT_CONFLICT",
                    "The operation conflicted with concurrent activity; retry later".to_string(),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
