//! Domain error taxonomy.
//!
//! Business-rule violations each get a named variant so the HTTP layer can
//! map them to stable machine-readable codes. Contention errors are not
//! represented here; they stay `sqlx::Error` and are classified by the
//! retry layer.

use crate::types::DbId;

/// Domain-level error shared across all layers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup by id came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Request-level validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic state conflict not covered by a more specific variant.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The lesson has no remaining capacity.
    #[error("Lesson {lesson_id} has no remaining capacity")]
    CapacityExhausted { lesson_id: DbId },

    /// The user already holds an active enrollment for this lesson.
    #[error("User {user_id} already has an active enrollment for lesson {lesson_id}")]
    DuplicateEnrollment { user_id: DbId, lesson_id: DbId },

    /// The registration window for this lesson is not open.
    #[error("Registration window closed: {0}")]
    WindowClosed(String),

    /// The user already holds an enrollment for another lesson this month.
    #[error("User {user_id} already has an enrollment for this month")]
    MonthlyLimit { user_id: DbId },

    /// No locker is available in the requested category.
    #[error("No locker available in category {category}")]
    LockerExhausted { category: String },

    /// A status transition that the state machine forbids.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Inconsistent persisted data that must not be auto-corrected.
    #[error("Data integrity violation: {0}")]
    IntegrityViolation(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
