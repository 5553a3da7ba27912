//! Error types for the revenue_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the revenue_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The observation table is absent, malformed or inconsistent
    #[error("Data error: {0}")]
    DataError(String),

    /// A value in the observation table could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Design matrix or response has the wrong shape for the requested fit
    #[error("Shape error: {0}")]
    ShapeError(String),

    /// Singular precision, non-positive posterior scale, missing degrees of freedom
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// The scenario assumption cannot be projected
    #[error("Scenario error: {0}")]
    ScenarioError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error while reading configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from the shared statistics helpers
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// True when the error means the historical data could not be obtained.
    ///
    /// Callers may substitute a synthetic table for these errors only. Model
    /// failures on well-formed data are never data-source errors.
    pub fn is_data_source(&self) -> bool {
        matches!(
            self,
            ForecastError::DataError(_)
                | ForecastError::ParseError(_)
                | ForecastError::IoError(_)
                | ForecastError::CsvError(_)
        )
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for ForecastError {
    fn from(err: std::num::ParseIntError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for ForecastError {
    fn from(err: std::num::ParseFloatError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}
