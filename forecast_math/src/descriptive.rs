//! Descriptive statistics
//!
//! Contains the moment calculations used by the fitters:
//! - Mean
//! - Variance and standard deviation with a delta degrees of freedom
//! - Sum of squares and Frobenius norm

use crate::{MathError, Result};

/// Arithmetic mean of a slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sum of squared values
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Variance around the mean with `ddof` delta degrees of freedom.
///
/// The divisor is `n - ddof`, so `ddof = 0` gives the population variance and
/// `ddof = 1` the usual sample variance.
pub fn variance(values: &[f64], ddof: usize) -> Result<f64> {
    if values.len() <= ddof {
        return Err(MathError::InsufficientData(format!(
            "Need more than {} values for variance with ddof={}, have {}",
            ddof,
            ddof,
            values.len()
        )));
    }

    let m = mean(values)?;
    let ss: f64 = values
        .iter()
        .map(|&v| {
            let diff = v - m;
            diff * diff
        })
        .sum();

    Ok(ss / (values.len() - ddof) as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom
pub fn std_dev(values: &[f64], ddof: usize) -> Result<f64> {
    Ok(variance(values, ddof)?.sqrt())
}

/// Frobenius norm of a row-major matrix given as a flat slice
pub fn frobenius_norm(entries: &[f64]) -> f64 {
    sum_of_squares(entries).sqrt()
}
