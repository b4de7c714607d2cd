//! Error types for the ecosystem_forecast crate

use thiserror::Error;

/// Custom error types for the ecosystem_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Too few observations survived loading or preprocessing
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Error from invalid caller-supplied parameters
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A model fit failed numerically
    #[error("Fit error: {0}")]
    FitError(String),

    /// The LLM completion service failed after bounded retries
    #[error("LLM service error: {0}")]
    LlmError(String),

    /// Error from the HTTP transport
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error decoding a JSON payload
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
