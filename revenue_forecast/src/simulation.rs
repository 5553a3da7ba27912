//! Monte Carlo predictive simulation

use crate::design::FeatureMatrix;
use crate::error::{ForecastError, Result};
use crate::models::{ensure_same_terms, FittedModel};
use rand::RngCore;
use rand_distr::{Distribution, Normal};

/// Simulated outcomes, one row per draw and one column per future period
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    draws: Vec<Vec<f64>>,
    horizon: usize,
}

impl Ensemble {
    /// Wrap precomputed trajectories; all rows must share one length
    pub fn from_draws(draws: Vec<Vec<f64>>) -> Result<Self> {
        let horizon = draws.first().map(Vec::len).unwrap_or(0);
        if draws.iter().any(|d| d.len() != horizon) {
            return Err(ForecastError::ShapeError(
                "Ensemble trajectories have different lengths".to_string(),
            ));
        }
        Ok(Self { draws, horizon })
    }

    /// All trajectories
    pub fn draws(&self) -> &[Vec<f64>] {
        &self.draws
    }

    /// Number of draws
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Check if there are no draws
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Number of future periods per trajectory
    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

/// Simulate one trajectory: mean prediction for a parameter draw plus Gaussian noise
pub fn simulate_trajectory(
    model: &dyn FittedModel,
    future: &FeatureMatrix,
    rng: &mut dyn RngCore,
) -> Result<Vec<f64>> {
    let params = model.draw_parameters(&mut *rng)?;
    let mean = future.values() * &*params.beta;

    let noise = Normal::new(0.0, params.sigma2.sqrt()).map_err(|e| {
        ForecastError::NumericalError(format!(
            "Invalid residual variance {}: {}",
            params.sigma2, e
        ))
    })?;

    Ok(mean.iter().map(|m| m + noise.sample(&mut *rng)).collect())
}

/// Draw `draws` predictive trajectories over the future design matrix
pub fn simulate(
    model: &dyn FittedModel,
    future: &FeatureMatrix,
    draws: usize,
    rng: &mut dyn RngCore,
) -> Result<Ensemble> {
    ensure_same_terms(model.terms(), future)?;
    if draws == 0 {
        return Err(ForecastError::InvalidParameter(
            "Number of draws must be at least one".to_string(),
        ));
    }

    let trajectories = (0..draws)
        .map(|_| simulate_trajectory(model, future, &mut *rng))
        .collect::<Result<Vec<_>>>()?;

    Ok(Ensemble {
        draws: trajectories,
        horizon: future.nrows(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ObservationTable, SyntheticConfig};
    use crate::models::{BootstrapFitter, Fitter};
    use crate::scenario::{project, ScenarioAssumption};
    use crate::design::TermSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ensemble_shape() {
        let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
        let terms = TermSpec::for_table(&table);
        let model = BootstrapFitter::new().fit(&table, &terms).unwrap();
        let projection = project(&table, &ScenarioAssumption::default(), &terms).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let ensemble = simulate(model.as_ref(), &projection.design, 250, &mut rng).unwrap();
        assert_eq!(ensemble.len(), 250);
        assert_eq!(ensemble.horizon(), 6);
    }

    #[test]
    fn test_mismatched_terms_rejected() {
        let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
        let model = BootstrapFitter::new().fit(&table, &TermSpec::full()).unwrap();
        let projection =
            project(&table, &ScenarioAssumption::default(), &TermSpec::trend_promo()).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let err = simulate(model.as_ref(), &projection.design, 10, &mut rng).unwrap_err();
        assert!(matches!(err, ForecastError::ShapeError(_)));
    }

    #[test]
    fn test_zero_draws_rejected() {
        let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
        let terms = TermSpec::full();
        let model = BootstrapFitter::new().fit(&table, &terms).unwrap();
        let projection = project(&table, &ScenarioAssumption::default(), &terms).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        assert!(simulate(model.as_ref(), &projection.design, 0, &mut rng).is_err());
    }

    #[test]
    fn test_from_draws_rejects_ragged_rows() {
        assert!(Ensemble::from_draws(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        let ensemble = Ensemble::from_draws(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(ensemble.horizon(), 2);
    }
}
