//! End-to-end forecast runs: fit, project, simulate, summarize

use crate::data::ObservationTable;
use crate::design::TermSpec;
use crate::error::{ForecastError, Result};
use crate::metrics::{fit_diagnostics, FitDiagnostics};
use crate::models::Fitter;
use crate::scenario::{project, ScenarioAssumption, ScenarioPeriod};
use crate::simulation::simulate;
use crate::summary::{ForecastRecord, IntervalSummarizer, DEFAULT_CREDIBLE_LEVEL};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default series label written to the forecast table
pub const DEFAULT_PRODUCT: &str = "Total Revenue";

/// Simulation settings for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Number of simulated trajectories
    pub draws: usize,
    /// Seed of the run's random generator
    pub seed: u64,
    /// Central credible level of the band
    pub credible_level: f64,
    /// Series label
    pub product: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            draws: 1000,
            seed: 1,
            credible_level: DEFAULT_CREDIBLE_LEVEL,
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

/// Everything a single forecast run produces
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub model_name: String,
    pub terms: TermSpec,
    /// Point estimates labelled by term
    pub coefficients: Vec<(&'static str, f64)>,
    pub periods: Vec<ScenarioPeriod>,
    pub records: Vec<ForecastRecord>,
    /// Point-estimate fit over the historical table
    pub fitted_values: Vec<f64>,
    pub diagnostics: FitDiagnostics,
}

/// Run the full pipeline with an explicit term specification.
///
/// Every input is checked before the first random draw. The generator is
/// seeded from `options.seed`, so identical inputs give identical records.
pub fn run_forecast(
    table: &ObservationTable,
    fitter: &dyn Fitter,
    terms: &TermSpec,
    assumption: &ScenarioAssumption,
    options: &RunOptions,
) -> Result<ForecastRun> {
    assumption.validate()?;
    if options.draws == 0 {
        return Err(ForecastError::ScenarioError(
            "Number of draws must be at least one".to_string(),
        ));
    }
    let summarizer = IntervalSummarizer::new(options.credible_level)?;

    let model = fitter.fit(table, terms)?;
    let projection = project(table, assumption, model.terms())?;

    let fitted_values = model.fitted_values(table)?;
    let diagnostics = fit_diagnostics(&fitted_values, &table.revenue())?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let ensemble = simulate(model.as_ref(), &projection.design, options.draws, &mut rng)?;
    let records = summarizer.summarize(&ensemble, &projection.periods, &options.product)?;

    info!(
        model = model.name(),
        observations = table.len(),
        horizon = records.len(),
        draws = options.draws,
        rmse = diagnostics.rmse,
        "Forecast complete"
    );

    Ok(ForecastRun {
        model_name: model.name().to_string(),
        terms: model.terms().clone(),
        coefficients: model.coefficients(),
        periods: projection.periods,
        records,
        fitted_values,
        diagnostics,
    })
}

/// Run the pipeline with every term the table has columns for
pub fn forecast(
    table: &ObservationTable,
    fitter: &dyn Fitter,
    assumption: &ScenarioAssumption,
    options: &RunOptions,
) -> Result<ForecastRun> {
    let terms = TermSpec::for_table(table);
    run_forecast(table, fitter, &terms, assumption, options)
}
