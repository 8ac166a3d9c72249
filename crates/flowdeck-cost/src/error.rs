//! Error types for usage aggregation.

use chrono::NaiveDate;
use thiserror::Error;

/// Usage aggregation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Range whose start falls after its end
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        /// First day of the range
        start: NaiveDate,
        /// Last day of the range
        end: NaiveDate,
    },
}

impl UsageError {
    /// Create a user-friendly message for this error.
    pub fn friendly_message(&self) -> String {
        match self {
            UsageError::InvalidRange { start, end } => format!(
                "Start date {} must not be after end date {}.",
                start.format("%d/%m/%Y"),
                end.format("%d/%m/%Y")
            ),
        }
    }
}

/// Result type for usage operations.
pub type Result<T> = std::result::Result<T, UsageError>;
