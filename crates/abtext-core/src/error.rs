//! Error types for abtext-core

use abtext_io::IoError;
use abtext_stats::StatsError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for abtext operations
pub type Result<T> = std::result::Result<T, AbTestError>;

/// Main error type for abtext operations
#[derive(Error, Debug)]
pub enum AbTestError {
    /// Dataset loading errors
    #[error("Failed to load dataset: {0}")]
    Io(#[from] IoError),

    /// Statistical computation errors
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The input contained no project records
    #[error("Dataset contains no projects: {0}")]
    EmptyDataset(String),

    /// A configured group ended up with no projects
    #[error("Group '{0}' received no projects")]
    EmptyGroup(String),

    /// Report serialization errors
    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
