//! Conjugate normal-inverse-gamma Bayesian regression
//!
//! Model: `y = X·β + ε`, `ε ~ N(0, σ²)`, with prior
//! `β | σ² ~ N(m0, σ²·V0)` and `σ² ~ InvGamma(a0, b0)`.
//!
//! The posterior is available in closed form:
//!
//! ```text
//! Vn⁻¹ = V0⁻¹ + XᵀX
//! mn   = Vn (V0⁻¹ m0 + Xᵀy)
//! an   = a0 + n/2
//! bn   = b0 + ½ (yᵀy + m0ᵀV0⁻¹m0 − mnᵀVn⁻¹mn)
//! ```
//!
//! `bn` is evaluated as `b0 + ½(‖y − X·mn‖² + (mn − m0)ᵀV0⁻¹(mn − m0))`,
//! which is the same quantity without the cancellation between large terms.

use crate::data::ObservationTable;
use crate::design::{FeatureMatrix, TermSpec};
use crate::error::{ForecastError, Result};
use crate::models::{ensure_response_len, Fitter, FittedModel, ParameterDraw};
use forecast_math::frobenius_norm;
use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use rand_distr::{Distribution, Gamma, StandardNormal};
use std::borrow::Cow;
use tracing::debug;

/// Prior variance on each coefficient when no covariance is given
pub const DEFAULT_COEFFICIENT_VARIANCE: f64 = 1e6;

/// Prior inverse-gamma shape
pub const DEFAULT_SHAPE: f64 = 2.0;

/// Prior inverse-gamma scale, a plausible residual magnitude squared
pub const DEFAULT_SCALE: f64 = 5000.0 * 5000.0;

/// Prior covariance over the coefficients
#[derive(Debug, Clone, PartialEq)]
pub enum PriorCovariance {
    /// `variance · I`
    Isotropic(f64),
    /// Explicit k x k covariance
    Full(DMatrix<f64>),
}

/// Normal-inverse-gamma prior
#[derive(Debug, Clone, PartialEq)]
pub struct ConjugatePrior {
    /// Prior mean `m0`; zeros when `None`
    pub mean: Option<DVector<f64>>,
    /// Prior covariance `V0`
    pub covariance: PriorCovariance,
    /// Inverse-gamma shape `a0`
    pub shape: f64,
    /// Inverse-gamma scale `b0`
    pub scale: f64,
}

impl Default for ConjugatePrior {
    fn default() -> Self {
        Self {
            mean: None,
            covariance: PriorCovariance::Isotropic(DEFAULT_COEFFICIENT_VARIANCE),
            shape: DEFAULT_SHAPE,
            scale: DEFAULT_SCALE,
        }
    }
}

impl ConjugatePrior {
    /// Zero-mean prior with isotropic coefficient variance
    pub fn new(coefficient_variance: f64, shape: f64, scale: f64) -> Result<Self> {
        let prior = Self {
            mean: None,
            covariance: PriorCovariance::Isotropic(coefficient_variance),
            shape,
            scale,
        };
        prior.validate()?;
        Ok(prior)
    }

    /// Set the prior mean
    pub fn with_mean(mut self, mean: DVector<f64>) -> Self {
        self.mean = Some(mean);
        self
    }

    /// Set a full prior covariance
    pub fn with_covariance(mut self, covariance: DMatrix<f64>) -> Self {
        self.covariance = PriorCovariance::Full(covariance);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.shape.is_finite() && self.shape > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Prior shape must be positive, got {}",
                self.shape
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Prior scale must be positive, got {}",
                self.scale
            )));
        }
        if let PriorCovariance::Isotropic(v) = self.covariance {
            if !(v.is_finite() && v > 0.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Prior coefficient variance must be positive and finite, got {}",
                    v
                )));
            }
        }
        Ok(())
    }

    /// Prior mean and the inverse of the prior covariance for `k` coefficients
    fn resolve(&self, k: usize) -> Result<(DVector<f64>, DMatrix<f64>)> {
        self.validate()?;

        let mean = match &self.mean {
            Some(m) if m.len() != k => {
                return Err(ForecastError::InvalidParameter(format!(
                    "Prior mean has {} entries but the model has {} terms",
                    m.len(),
                    k
                )))
            }
            Some(m) => m.clone(),
            None => DVector::zeros(k),
        };

        let precision = match &self.covariance {
            PriorCovariance::Isotropic(v) => DMatrix::identity(k, k) / *v,
            PriorCovariance::Full(cov) => {
                if cov.nrows() != k || cov.ncols() != k {
                    return Err(ForecastError::InvalidParameter(format!(
                        "Prior covariance is {}x{} but the model has {} terms",
                        cov.nrows(),
                        cov.ncols(),
                        k
                    )));
                }
                cov.clone()
                    .cholesky()
                    .ok_or_else(|| {
                        ForecastError::InvalidParameter(
                            "Prior covariance must be symmetric positive definite".to_string(),
                        )
                    })?
                    .inverse()
            }
        };

        Ok((mean, precision))
    }
}

/// Closed-form Bayesian fitter
#[derive(Debug, Clone)]
pub struct ConjugateFitter {
    name: String,
    prior: ConjugatePrior,
}

impl Default for ConjugateFitter {
    fn default() -> Self {
        Self {
            name: "Conjugate Bayesian".to_string(),
            prior: ConjugatePrior::default(),
        }
    }
}

impl ConjugateFitter {
    /// Create a fitter with the given prior
    pub fn new(prior: ConjugatePrior) -> Result<Self> {
        prior.validate()?;
        Ok(Self {
            prior,
            ..Self::default()
        })
    }

    /// The prior in use
    pub fn prior(&self) -> &ConjugatePrior {
        &self.prior
    }

    /// Compute the posterior for a design matrix and response.
    ///
    /// Fewer observations than terms is allowed; the proper prior keeps the
    /// posterior precision invertible.
    pub fn fit_matrix(&self, x: &FeatureMatrix, y: &[f64]) -> Result<ConjugatePosterior> {
        ensure_response_len(x, y)?;
        let n = x.nrows();
        let k = x.ncols();
        if n == 0 {
            return Err(ForecastError::ShapeError(
                "Cannot fit a model without observations".to_string(),
            ));
        }

        let (m0, v0_inv) = self.prior.resolve(k)?;
        let xm = x.values();
        let yv = DVector::from_column_slice(y);
        let xt = xm.transpose();

        let precision = &v0_inv + &xt * xm;
        let precision_chol = precision.clone().cholesky().ok_or_else(|| {
            ForecastError::NumericalError(
                "Posterior precision matrix is singular or not positive definite".to_string(),
            )
        })?;
        let covariance = precision_chol.inverse();
        let mean = precision_chol.solve(&(&v0_inv * &m0 + &xt * &yv));

        let shape = self.prior.shape + n as f64 / 2.0;
        let residuals = &yv - xm * &mean;
        let shift = &mean - &m0;
        let scale =
            self.prior.scale + 0.5 * (residuals.norm_squared() + shift.dot(&(&v0_inv * &shift)));

        if !(scale.is_finite() && scale > 0.0) {
            return Err(ForecastError::NumericalError(format!(
                "Posterior scale must be positive, got {}",
                scale
            )));
        }

        let chol_l = covariance
            .clone()
            .cholesky()
            .ok_or_else(|| {
                ForecastError::NumericalError(
                    "Posterior covariance is not positive definite".to_string(),
                )
            })?
            .l();

        // Precision 1/σ² ~ Gamma(an, 1/bn)
        let noise_precision = Gamma::new(shape, 1.0 / scale)
            .map_err(|e| ForecastError::NumericalError(format!("Posterior gamma: {}", e)))?;

        debug!(
            n,
            k,
            shape,
            scale,
            covariance_norm = frobenius_norm(covariance.as_slice()),
            mean = ?mean.as_slice(),
            "conjugate posterior computed"
        );

        Ok(ConjugatePosterior {
            name: self.name.clone(),
            terms: x.terms().clone(),
            n_obs: n,
            mean,
            covariance,
            precision,
            shape,
            scale,
            chol_l,
            noise_precision,
        })
    }
}

impl Fitter for ConjugateFitter {
    fn fit(&self, table: &ObservationTable, terms: &TermSpec) -> Result<Box<dyn FittedModel>> {
        let x = terms.build(table.observations())?;
        let posterior = self.fit_matrix(&x, &table.revenue())?;
        Ok(Box::new(posterior))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One joint posterior draw
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorSample {
    pub beta: DVector<f64>,
    pub sigma2: f64,
}

/// Normal-inverse-gamma posterior
#[derive(Debug, Clone)]
pub struct ConjugatePosterior {
    name: String,
    terms: TermSpec,
    n_obs: usize,
    /// `mn`
    mean: DVector<f64>,
    /// `Vn`
    covariance: DMatrix<f64>,
    /// `Vn⁻¹`
    precision: DMatrix<f64>,
    /// `an`
    shape: f64,
    /// `bn`
    scale: f64,
    /// Lower Cholesky factor of `Vn`
    chol_l: DMatrix<f64>,
    noise_precision: Gamma<f64>,
}

impl ConjugatePosterior {
    /// Posterior mean `mn`
    pub fn posterior_mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Posterior covariance `Vn` (scaled by σ² in the joint posterior)
    pub fn posterior_covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Posterior precision `Vn⁻¹`
    pub fn posterior_precision(&self) -> &DMatrix<f64> {
        &self.precision
    }

    /// Inverse-gamma shape `an`
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Inverse-gamma scale `bn`
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of observations the posterior was computed from
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Posterior expectation of σ², defined when `an > 1`
    pub fn expected_noise_variance(&self) -> Option<f64> {
        (self.shape > 1.0).then(|| self.scale / (self.shape - 1.0))
    }

    /// Marginal posterior standard deviation of each coefficient
    pub fn coefficient_std(&self) -> Option<DVector<f64>> {
        let sigma2 = self.expected_noise_variance()?;
        Some(self.covariance.diagonal().map(|v| (sigma2 * v).sqrt()))
    }

    /// Draw `count` joint samples of (β, σ²)
    pub fn sample(&self, count: usize, rng: &mut dyn RngCore) -> Result<Vec<PosteriorSample>> {
        (0..count)
            .map(|_| {
                let draw = self.draw_parameters(&mut *rng)?;
                Ok(PosteriorSample {
                    beta: draw.beta.into_owned(),
                    sigma2: draw.sigma2,
                })
            })
            .collect()
    }
}

impl FittedModel for ConjugatePosterior {
    fn name(&self) -> &str {
        &self.name
    }

    fn terms(&self) -> &TermSpec {
        &self.terms
    }

    fn point_coefficients(&self) -> &DVector<f64> {
        &self.mean
    }

    fn draw_parameters(&self, rng: &mut dyn RngCore) -> Result<ParameterDraw<'_>> {
        let sigma2 = 1.0 / self.noise_precision.sample(&mut *rng);
        if !sigma2.is_finite() {
            return Err(ForecastError::NumericalError(
                "Drew a non-finite residual variance".to_string(),
            ));
        }

        let k = self.mean.len();
        let z = DVector::from_iterator(
            k,
            (0..k).map(|_| {
                let v: f64 = StandardNormal.sample(&mut *rng);
                v
            }),
        );
        let beta = &self.mean + (&self.chol_l * z) * sigma2.sqrt();

        Ok(ParameterDraw {
            beta: Cow::Owned(beta),
            sigma2,
        })
    }
}
