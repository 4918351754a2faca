//! Unified error type for the footprint engine and its store adapters.

use thiserror::Error;

/// All failures the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown category, negative or non-finite amount, or an out-of-range period.
    #[error("Invalid {field}: {reason}")]
    InvalidInputKind {
        /// Which input was rejected
        field: String,
        /// Human-readable explanation
        reason: String,
    },

    /// Any I/O failure or timeout at the store boundary.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Underlying driver or timeout message
        message: String,
    },

    /// A concurrent writer changed the monthly aggregate first.
    #[error("Aggregate conflict for user {user_id} in {year}-{month}")]
    AggregateConflict {
        /// Owner of the aggregate
        user_id: String,
        /// Calendar year of the aggregate
        year: i32,
        /// Calendar month (1-12) of the aggregate
        month: u32,
    },

    /// Configuration file, environment, or factor table problems.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable explanation
        message: String,
    },

    /// A stored row that cannot be mapped back to domain types.
    #[error("Corrupt record: {message}")]
    CorruptRecord {
        /// Human-readable explanation
        message: String,
    },
}

impl Error {
    /// Builds an [`Error::InvalidInputKind`] for `field`.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInputKind {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::AggregateConflict { .. }
        )
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::StoreUnavailable {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
