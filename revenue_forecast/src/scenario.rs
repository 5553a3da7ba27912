//! What-if scenarios projected over the forecast horizon

use crate::data::{holiday_season, next_month_start, promo_season, ObservationTable};
use crate::design::{Covariates, FeatureMatrix, TermSpec};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Forward-looking assumptions for one forecast run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAssumption {
    /// Number of future months
    pub horizon: usize,
    /// Apply the Oct through Feb promotion rule
    pub promo_policy: bool,
    /// Apply the Nov and Dec holiday rule
    pub holiday_policy: bool,
    /// Monthly change in the price index, from the last observed value
    pub price_step: f64,
}

impl Default for ScenarioAssumption {
    fn default() -> Self {
        Self {
            horizon: 6,
            promo_policy: true,
            holiday_policy: true,
            price_step: 0.01,
        }
    }
}

impl ScenarioAssumption {
    /// Check the assumption can be projected
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::ScenarioError(
                "Forecast horizon must be at least one month".to_string(),
            ));
        }
        if !self.price_step.is_finite() {
            return Err(ForecastError::ScenarioError(format!(
                "Price step must be finite, got {}",
                self.price_step
            )));
        }
        Ok(())
    }
}

/// One future month with its scenario covariates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPeriod {
    pub date: NaiveDate,
    pub t: u32,
    pub promo: bool,
    pub holiday: bool,
    pub price_index: f64,
}

impl Covariates for ScenarioPeriod {
    fn t(&self) -> u32 {
        self.t
    }

    fn promo(&self) -> Option<bool> {
        Some(self.promo)
    }

    fn holiday(&self) -> Option<bool> {
        Some(self.holiday)
    }

    fn price_index(&self) -> Option<f64> {
        Some(self.price_index)
    }
}

/// Future periods and the design matrix built from them
#[derive(Debug, Clone)]
pub struct ScenarioProjection {
    pub periods: Vec<ScenarioPeriod>,
    pub design: FeatureMatrix,
}

/// Continue the historical calendar under the given assumption.
///
/// Price drifts linearly from the last observed index and is not clamped.
/// A table without a price column is treated as sitting at an index of 1.0.
pub fn project_periods(
    table: &ObservationTable,
    assumption: &ScenarioAssumption,
) -> Result<Vec<ScenarioPeriod>> {
    assumption.validate()?;

    let last = table.last();
    let last_price = last.price_index.unwrap_or(1.0);
    let mut date = last.date;

    let mut periods = Vec::with_capacity(assumption.horizon);
    for k in 1..=assumption.horizon {
        date = next_month_start(date).ok_or_else(|| {
            ForecastError::ScenarioError(format!("Calendar overflow after {}", date))
        })?;
        let month = date.month();
        let t = u32::try_from(k)
            .ok()
            .and_then(|k| last.t.checked_add(k))
            .ok_or_else(|| {
                ForecastError::ScenarioError(format!("Time index overflows after {}", last.t))
            })?;

        periods.push(ScenarioPeriod {
            date,
            t,
            promo: assumption.promo_policy && promo_season(month),
            holiday: assumption.holiday_policy && holiday_season(month),
            price_index: last_price + assumption.price_step * k as f64,
        });
    }

    Ok(periods)
}

/// Project the scenario and build its design matrix with the fitted terms
pub fn project(
    table: &ObservationTable,
    assumption: &ScenarioAssumption,
    terms: &TermSpec,
) -> Result<ScenarioProjection> {
    let periods = project_periods(table, assumption)?;
    let design = terms.build(&periods)?;
    Ok(ScenarioProjection { periods, design })
}
