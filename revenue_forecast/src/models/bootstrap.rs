//! Least squares point fit with simulated residual noise

use crate::data::ObservationTable;
use crate::design::{FeatureMatrix, TermSpec};
use crate::error::{ForecastError, Result};
use crate::models::{ensure_response_len, Fitter, FittedModel, ParameterDraw};
use forecast_math::sum_of_squares;
use nalgebra::DVector;
use rand::RngCore;
use std::borrow::Cow;
use tracing::debug;

/// Relative singular value cutoff below which the design is rank deficient
const RANK_TOLERANCE: f64 = 1e-10;

/// Ordinary least squares fitter with residual bootstrap draws
#[derive(Debug, Clone)]
pub struct BootstrapFitter {
    name: String,
}

impl Default for BootstrapFitter {
    fn default() -> Self {
        Self {
            name: "OLS + Bootstrap".to_string(),
        }
    }
}

impl BootstrapFitter {
    /// Create a new bootstrap fitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Least squares fit of a design matrix and response.
    ///
    /// Needs strictly more observations than terms so the residual standard
    /// deviation has at least one degree of freedom.
    pub fn fit_matrix(&self, x: &FeatureMatrix, y: &[f64]) -> Result<OlsFit> {
        ensure_response_len(x, y)?;
        let n = x.nrows();
        let k = x.ncols();
        if n <= k {
            return Err(ForecastError::NumericalError(format!(
                "Residual degrees of freedom must be positive: {} observations for {} terms",
                n, k
            )));
        }

        let yv = DVector::from_column_slice(y);
        let svd = x.values().clone().svd(true, true);

        let max_sv = svd.singular_values.max();
        let eps = max_sv * RANK_TOLERANCE;
        let rank = svd.rank(eps);
        if rank < k {
            return Err(ForecastError::NumericalError(format!(
                "Design matrix is rank deficient: rank {} for {} terms",
                rank, k
            )));
        }

        let beta_hat = svd
            .solve(&yv, eps)
            .map_err(|e| ForecastError::NumericalError(e.to_string()))?;

        let residuals: Vec<f64> = (&yv - x.values() * &beta_hat).iter().copied().collect();
        let dof = n - k;
        let sigma_hat = (sum_of_squares(&residuals) / dof as f64).sqrt();

        debug!(n, k, sigma_hat, beta = ?beta_hat.as_slice(), "least squares fit computed");

        Ok(OlsFit {
            name: self.name.clone(),
            terms: x.terms().clone(),
            beta_hat,
            sigma_hat,
            residuals,
            dof,
        })
    }
}

impl Fitter for BootstrapFitter {
    fn fit(&self, table: &ObservationTable, terms: &TermSpec) -> Result<Box<dyn FittedModel>> {
        let x = terms.build(table.observations())?;
        let fit = self.fit_matrix(&x, &table.revenue())?;
        Ok(Box::new(fit))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Least squares point estimate and residual scale
#[derive(Debug, Clone)]
pub struct OlsFit {
    name: String,
    terms: TermSpec,
    beta_hat: DVector<f64>,
    sigma_hat: f64,
    residuals: Vec<f64>,
    dof: usize,
}

impl OlsFit {
    /// Least squares coefficients
    pub fn beta_hat(&self) -> &DVector<f64> {
        &self.beta_hat
    }

    /// Residual standard deviation with `n - k` degrees of freedom
    pub fn sigma_hat(&self) -> f64 {
        self.sigma_hat
    }

    /// Historical residuals `y - X·beta_hat`
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Residual degrees of freedom `n - k`
    pub fn dof(&self) -> usize {
        self.dof
    }
}

impl FittedModel for OlsFit {
    fn name(&self) -> &str {
        &self.name
    }

    fn terms(&self) -> &TermSpec {
        &self.terms
    }

    fn point_coefficients(&self) -> &DVector<f64> {
        &self.beta_hat
    }

    /// The coefficients stay at the point estimate; only the noise varies.
    fn draw_parameters(&self, _rng: &mut dyn RngCore) -> Result<ParameterDraw<'_>> {
        Ok(ParameterDraw {
            beta: Cow::Borrowed(&self.beta_hat),
            sigma2: self.sigma_hat * self.sigma_hat,
        })
    }
}
