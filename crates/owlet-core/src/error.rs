//! Core error types for owlet-core.
//!
//! Each domain module defines its own error enum; this module aggregates
//! them into a single `CoreError` for callers that cross module boundaries.

use thiserror::Error;

use crate::config::ConfigError;
use crate::progress::StoreError;
use crate::time::TimeError;

/// Core error type for owlet-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Time resolution errors
    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    /// Progress store errors
    #[error("Progress store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
