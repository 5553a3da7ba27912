//! Run configuration loaded from TOML
//!
//! # Example
//!
//! ```toml
//! method = "conjugate"
//! seed = 1
//! draws = 1000
//!
//! [scenario]
//! horizon = 6
//! price_step = 0.01
//!
//! [prior]
//! coefficient_variance = 1e6
//! ```

use crate::engine::{RunOptions, DEFAULT_PRODUCT};
use crate::error::{ForecastError, Result};
use crate::models::conjugate::{DEFAULT_COEFFICIENT_VARIANCE, DEFAULT_SCALE, DEFAULT_SHAPE};
use crate::models::{BootstrapFitter, ConjugateFitter, ConjugatePrior, Fitter};
use crate::scenario::ScenarioAssumption;
use crate::summary::DEFAULT_CREDIBLE_LEVEL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Horizons offered by the scenario controls
pub const HORIZON_RANGE: (usize, usize) = (3, 12);
/// Monthly price steps offered by the scenario controls
pub const PRICE_STEP_RANGE: (f64, f64) = (-0.03, 0.05);
/// Draw counts offered by the scenario controls
pub const ALLOWED_DRAWS: [usize; 4] = [200, 500, 1000, 2000];

/// Which fitter produces the parameter uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Closed-form normal-inverse-gamma posterior
    #[default]
    Conjugate,
    /// Least squares with Gaussian residual resampling
    Bootstrap,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Conjugate => write!(f, "conjugate"),
            Method::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

/// Hyperparameters of the conjugate prior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorConfig {
    /// Diagonal of the isotropic prior covariance
    pub coefficient_variance: f64,
    /// Inverse-gamma shape a0
    pub shape: f64,
    /// Inverse-gamma scale b0
    pub scale: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            coefficient_variance: DEFAULT_COEFFICIENT_VARIANCE,
            shape: DEFAULT_SHAPE,
            scale: DEFAULT_SCALE,
        }
    }
}

impl PriorConfig {
    pub fn to_prior(&self) -> Result<ConjugatePrior> {
        ConjugatePrior::new(self.coefficient_variance, self.shape, self.scale)
    }
}

/// What-if controls as offered to a user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioControls {
    pub horizon: usize,
    pub price_step: f64,
    pub promo_policy: bool,
    pub holiday_policy: bool,
}

impl Default for ScenarioControls {
    fn default() -> Self {
        let assumption = ScenarioAssumption::default();
        Self {
            horizon: assumption.horizon,
            price_step: assumption.price_step,
            promo_policy: assumption.promo_policy,
            holiday_policy: assumption.holiday_policy,
        }
    }
}

impl ScenarioControls {
    /// Check the controls stay inside the offered ranges
    pub fn validate(&self) -> Result<()> {
        let (min_h, max_h) = HORIZON_RANGE;
        if !(min_h..=max_h).contains(&self.horizon) {
            return Err(ForecastError::ScenarioError(format!(
                "Horizon must be between {} and {} months, got {}",
                min_h, max_h, self.horizon
            )));
        }

        let (min_step, max_step) = PRICE_STEP_RANGE;
        if !(min_step..=max_step).contains(&self.price_step) {
            return Err(ForecastError::ScenarioError(format!(
                "Price step must be between {} and {}, got {}",
                min_step, max_step, self.price_step
            )));
        }
        Ok(())
    }

    pub fn to_assumption(&self) -> ScenarioAssumption {
        ScenarioAssumption {
            horizon: self.horizon,
            promo_policy: self.promo_policy,
            holiday_policy: self.holiday_policy,
            price_step: self.price_step,
        }
    }
}

/// Root configuration of a forecast run.
///
/// Every field is optional; an empty file gives the conjugate model with
/// a six month horizon and 1000 draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub method: Method,
    /// Seed of the simulation
    pub seed: u64,
    /// Seed of the synthetic table used when no data file can be loaded
    pub data_seed: u64,
    pub draws: usize,
    pub credible_level: f64,
    /// Series label written to the forecast table
    pub product: String,
    pub scenario: ScenarioControls,
    pub prior: PriorConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let options = RunOptions::default();
        Self {
            method: Method::default(),
            seed: options.seed,
            data_seed: 10,
            draws: options.draws,
            credible_level: DEFAULT_CREDIBLE_LEVEL,
            product: DEFAULT_PRODUCT.to_string(),
            scenario: ScenarioControls::default(),
            prior: PriorConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ForecastError::ConfigError(format!(
                "Cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration against the offered controls
    pub fn validate(&self) -> Result<()> {
        self.scenario.validate()?;

        if !ALLOWED_DRAWS.contains(&self.draws) {
            return Err(ForecastError::ScenarioError(format!(
                "Draws must be one of {:?}, got {}",
                ALLOWED_DRAWS, self.draws
            )));
        }
        if !(self.credible_level > 0.0 && self.credible_level < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "Credible level must be between 0 and 1, got {}",
                self.credible_level
            )));
        }
        if self.product.trim().is_empty() {
            return Err(ForecastError::ConfigError(
                "Product label must not be empty".to_string(),
            ));
        }
        if self.method == Method::Conjugate {
            self.prior.to_prior()?;
        }
        Ok(())
    }

    /// Build the configured fitter
    pub fn fitter(&self) -> Result<Box<dyn Fitter>> {
        Ok(match self.method {
            Method::Conjugate => Box::new(ConjugateFitter::new(self.prior.to_prior()?)?),
            Method::Bootstrap => Box::new(BootstrapFitter::new()),
        })
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            draws: self.draws,
            seed: self.seed,
            credible_level: self.credible_level,
            product: self.product.clone(),
        }
    }
}
