//! In-sample accuracy of a fitted model

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Accuracy of the point-estimate fit over the historical table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnostics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// Compare fitted values against observed revenue
pub fn fit_diagnostics(fitted: &[f64], actual: &[f64]) -> Result<FitDiagnostics> {
    if fitted.len() != actual.len() || fitted.is_empty() {
        return Err(ForecastError::ShapeError(
            "Fitted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = fitted.len() as f64;
    let errors: Vec<f64> = fitted
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (forecast_math::sum_of_squares(&errors) / n).sqrt();

    let mape = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .sum::<f64>()
        / n;

    let smape = actual
        .iter()
        .zip(fitted.iter())
        .map(|(&a, &f)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(FitDiagnostics {
        mae,
        rmse,
        mape,
        smape,
    })
}

impl std::fmt::Display for FitDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Historical Fit:")?;
        writeln!(f, "  MAE:   {:.2}", self.mae)?;
        writeln!(f, "  RMSE:  {:.2}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.2}%", self.mape)?;
        writeln!(f, "  SMAPE: {:.2}%", self.smape)?;
        Ok(())
    }
}
