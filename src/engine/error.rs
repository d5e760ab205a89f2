//! Error taxonomy for the scheduling engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong inside the engine.
///
/// Validation and configuration errors are raised before a transaction is
/// opened. Everything else aborts the running transaction, so callers never
/// observe a partial shift or a partial insertion.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("status \"{0}\" not found")]
    StatusNotFound(String),

    #[error("no free business day for cell {cell_id} within {max_days} days of {from}")]
    ConflictResolutionExhausted {
        cell_id: i64,
        from: NaiveDate,
        max_days: u32,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid setting {key}={value:?}")]
    Config { key: String, value: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ScheduleError {
    /// True for errors caused by the caller's input rather than the store.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidArgument(_) | Self::StatusNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
