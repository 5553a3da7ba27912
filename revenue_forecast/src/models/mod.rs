//! Linear demand models and their uncertainty
//!
//! Both fitters produce a [`FittedModel`], whose only sampling operation is
//! [`FittedModel::draw_parameters`]: one coefficient vector and one residual
//! variance. The predictive simulation and interval summary are written once
//! against that capability.

use crate::data::ObservationTable;
use crate::design::{FeatureMatrix, TermSpec};
use crate::error::{ForecastError, Result};
use nalgebra::DVector;
use rand::RngCore;
use std::borrow::Cow;
use std::fmt::Debug;

pub mod bootstrap;
pub mod conjugate;

pub use bootstrap::{BootstrapFitter, OlsFit};
pub use conjugate::{ConjugateFitter, ConjugatePosterior, ConjugatePrior, PosteriorSample};

/// One draw of model parameters used to simulate a trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDraw<'a> {
    /// Coefficient vector, in term order
    pub beta: Cow<'a, DVector<f64>>,
    /// Residual variance
    pub sigma2: f64,
}

/// Model fitted to a historical table
pub trait FittedModel: Debug {
    /// Name of the model
    fn name(&self) -> &str;

    /// Term specification the model was fitted with
    fn terms(&self) -> &TermSpec;

    /// Point estimate of the coefficients (posterior mean or least squares)
    fn point_coefficients(&self) -> &DVector<f64>;

    /// Draw one coefficient vector and residual variance
    fn draw_parameters(&self, rng: &mut dyn RngCore) -> Result<ParameterDraw<'_>>;

    /// Mean prediction `X · beta` using the point estimate
    fn predict_mean(&self, design: &FeatureMatrix) -> Result<DVector<f64>> {
        ensure_same_terms(self.terms(), design)?;
        Ok(design.values() * self.point_coefficients())
    }

    /// Point-estimate fit over the historical periods
    fn fitted_values(&self, table: &ObservationTable) -> Result<Vec<f64>> {
        let x = self.terms().build(table.observations())?;
        Ok(self.predict_mean(&x)?.iter().copied().collect())
    }

    /// Point estimates labelled by term name
    fn coefficients(&self) -> Vec<(&'static str, f64)> {
        self.terms()
            .names()
            .into_iter()
            .zip(self.point_coefficients().iter().copied())
            .collect()
    }
}

/// Strategy that fits a [`FittedModel`] to historical observations
pub trait Fitter: Debug {
    /// Fit the model on the table using the given term specification
    fn fit(&self, table: &ObservationTable, terms: &TermSpec) -> Result<Box<dyn FittedModel>>;

    /// Get the name of the fitter
    fn name(&self) -> &str;
}

/// Reject a design matrix built from a different term specification
pub(crate) fn ensure_same_terms(expected: &TermSpec, design: &FeatureMatrix) -> Result<()> {
    if design.terms() != expected {
        return Err(ForecastError::ShapeError(format!(
            "Design matrix columns {:?} do not match the model terms {:?}",
            design.terms().names(),
            expected.names()
        )));
    }
    Ok(())
}

/// Check that the response matches the design rows
pub(crate) fn ensure_response_len(design: &FeatureMatrix, y: &[f64]) -> Result<()> {
    if design.nrows() != y.len() {
        return Err(ForecastError::ShapeError(format!(
            "Design matrix has {} rows but the response has {} values",
            design.nrows(),
            y.len()
        )));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ShapeError(
            "Response contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
