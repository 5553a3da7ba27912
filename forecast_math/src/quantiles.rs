//! Percentiles and per-column ensemble summaries
//!
//! Percentiles use linear interpolation between order statistics: for a
//! sorted sample `x[0..n]` and a fraction `q`, the rank is `q * (n - 1)` and
//! the value is interpolated between the two neighbouring order statistics.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Mean and central interval of one ensemble column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Percentile of `values` at fraction `q` in `[0, 1]`
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a percentile of an empty sample".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Percentile fraction must be within [0, 1], got {}",
            q
        )));
    }

    let mut sorted = values.to_vec();
    if sorted.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Sample contains non-finite values".to_string(),
        ));
    }
    sorted.sort_by(f64::total_cmp);

    Ok(interpolate_sorted(&sorted, q))
}

fn interpolate_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Summarize every column of a draws x periods ensemble.
///
/// Each row is one simulated trajectory. The returned vector holds one
/// summary per column: the mean across rows and the `(q_lower, q_upper)`
/// percentiles across rows.
pub fn summarize_columns(
    rows: &[Vec<f64>],
    q_lower: f64,
    q_upper: f64,
) -> Result<Vec<ColumnSummary>> {
    let width = match rows.first() {
        Some(row) => row.len(),
        None => {
            return Err(MathError::InsufficientData(
                "Ensemble has no draws".to_string(),
            ))
        }
    };
    if rows.iter().any(|row| row.len() != width) {
        return Err(MathError::InvalidInput(
            "Ensemble rows have different lengths".to_string(),
        ));
    }
    if q_lower > q_upper {
        return Err(MathError::InvalidInput(format!(
            "Lower percentile {} exceeds upper percentile {}",
            q_lower, q_upper
        )));
    }

    let mut column = Vec::with_capacity(rows.len());
    let mut summaries = Vec::with_capacity(width);

    for j in 0..width {
        column.clear();
        column.extend(rows.iter().map(|row| row[j]));

        let mean = crate::mean(&column)?;
        let lower = percentile(&column, q_lower)?;
        let upper = percentile(&column, q_upper)?;
        summaries.push(ColumnSummary { mean, lower, upper });
    }

    Ok(summaries)
}
