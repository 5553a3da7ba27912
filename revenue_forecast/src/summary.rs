//! Interval summaries of a simulation ensemble

use crate::error::{ForecastError, Result};
use crate::scenario::ScenarioPeriod;
use crate::simulation::Ensemble;
use chrono::NaiveDate;
use forecast_math::summarize_columns;
use serde::{Deserialize, Serialize};

/// Default central credible level
pub const DEFAULT_CREDIBLE_LEVEL: f64 = 0.95;

/// Summary of one future period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    /// Series label
    pub product: String,
    /// Mean of the simulated outcomes
    pub yhat: f64,
    /// Lower bound of the central credible interval
    pub yhat_lower: f64,
    /// Upper bound of the central credible interval
    pub yhat_upper: f64,
    /// Scenario covariates the period was simulated with
    #[serde(skip)]
    pub scenario: Option<ScenarioPeriod>,
}

impl ForecastRecord {
    /// Width of the credible interval
    pub fn interval_width(&self) -> f64 {
        self.yhat_upper - self.yhat_lower
    }
}

/// Reduces an ensemble to a mean and a central percentile band per period.
///
/// Percentiles interpolate linearly between order statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalSummarizer {
    level: f64,
}

impl Default for IntervalSummarizer {
    fn default() -> Self {
        Self {
            level: DEFAULT_CREDIBLE_LEVEL,
        }
    }
}

impl IntervalSummarizer {
    /// Create a summarizer for a central interval at `level`, e.g. 0.95
    pub fn new(level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Credible level must be between 0 and 1, got {}",
                level
            )));
        }
        Ok(Self { level })
    }

    /// Credible level of the band
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Lower and upper percentile fractions, (0.025, 0.975) at the default level
    pub fn bounds(&self) -> (f64, f64) {
        let tail = (1.0 - self.level) / 2.0;
        (tail, 1.0 - tail)
    }

    /// One record per period, in horizon order
    pub fn summarize(
        &self,
        ensemble: &Ensemble,
        periods: &[ScenarioPeriod],
        product: &str,
    ) -> Result<Vec<ForecastRecord>> {
        if ensemble.horizon() != periods.len() {
            return Err(ForecastError::ShapeError(format!(
                "Ensemble covers {} periods but {} were projected",
                ensemble.horizon(),
                periods.len()
            )));
        }

        let (q_lower, q_upper) = self.bounds();
        let columns = summarize_columns(ensemble.draws(), q_lower, q_upper)?;

        Ok(columns
            .into_iter()
            .zip(periods)
            .map(|(column, period)| ForecastRecord {
                date: period.date,
                product: product.to_string(),
                yhat: column.mean,
                yhat_lower: column.lower,
                yhat_upper: column.upper,
                scenario: Some(*period),
            })
            .collect())
    }
}
