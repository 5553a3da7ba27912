//! # Forecast Math
//!
//! Numeric helpers shared by the forecasting engine.
//! This crate provides the descriptive statistics used to characterize
//! residuals and the percentile machinery used to turn a simulation
//! ensemble into credible intervals.

use thiserror::Error;

pub mod descriptive;
pub mod quantiles;

pub use descriptive::{frobenius_norm, mean, std_dev, sum_of_squares, variance};
pub use quantiles::{percentile, summarize_columns, ColumnSummary};

/// Errors that can occur in forecast math calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecast math operations
pub type Result<T> = std::result::Result<T, MathError>;
