//! Application-wide error taxonomy.
//!
//! Library crates keep their own detailed error enums and convert into
//! `AppError` at the boundary with the excluded CRUD/HTTP layer.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request shape or business validation failed before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation is not legal in the current lifecycle state.
    #[error("Invalid state: {0}")]
    State(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger invariant violated. Never a normal business condition.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Contention or timeout; safe to retry.
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::State(_) => "STATE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Consistency(_) => "CONSISTENCY_ERROR",
            Self::Concurrency(_) => "CONCURRENCY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Concurrency(_))
    }

    /// Returns true if the error must not be shown to end users as a normal failure.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Consistency(_) | Self::Database(_) | Self::Internal(_)
        )
    }
}
