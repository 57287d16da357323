//! Error types for abtext-stats

use thiserror::Error;

/// Result type alias for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors raised by statistical computations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// A group with no observations was passed to a test
    #[error("Group '{0}' has no observations")]
    EmptyGroup(String),

    /// A probability-like argument is outside (0, 1)
    #[error("Invalid probability for {name}: {value}")]
    InvalidProbability { name: String, value: f64 },

    /// Baseline and target rates coincide
    #[error("Effect size is zero: both rates equal {0}")]
    ZeroEffect(f64),

    /// Success count exceeds the total
    #[error("Invalid counts: {successes} successes out of {total}")]
    InvalidCounts { successes: u64, total: u64 },

    /// A distribution could not be constructed
    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Check that `value` lies strictly inside (0, 1)
pub(crate) fn check_open_unit(name: &str, value: f64) -> StatsResult<f64> {
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(StatsError::InvalidProbability {
            name: name.to_string(),
            value,
        })
    }
}
