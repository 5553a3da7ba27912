//! # Revenue Forecast
//!
//! Probabilistic forecasts of monthly retail revenue from a linear demand model.
//!
//! ## Features
//!
//! - Observation tables loaded from CSV, or generated synthetically
//! - Design matrices driven by an explicit, immutable term specification
//! - Conjugate normal-inverse-gamma regression with closed-form posterior
//! - Least squares with Gaussian residual resampling
//! - What-if scenarios for promotions, holidays and price drift
//! - Monte Carlo predictive intervals and dashboard KPIs
//!
//! ## Pipeline
//!
//! Both techniques share one shape: fit, characterize uncertainty, project the
//! scenario, summarize the interval. [`engine::run_forecast`] drives all four.
//!
//! ## Quick Start
//!
//! ```rust
//! use revenue_forecast::data::{ObservationTable, SyntheticConfig};
//! use revenue_forecast::engine::{forecast, RunOptions};
//! use revenue_forecast::models::ConjugateFitter;
//! use revenue_forecast::scenario::ScenarioAssumption;
//!
//! # fn main() -> revenue_forecast::Result<()> {
//! // 36 months of synthetic history
//! let table = ObservationTable::generate(&SyntheticConfig::default())?;
//!
//! let run = forecast(
//!     &table,
//!     &ConjugateFitter::default(),
//!     &ScenarioAssumption::default(),
//!     &RunOptions::default(),
//! )?;
//!
//! assert_eq!(run.records.len(), 6);
//! for record in &run.records {
//!     assert!(record.yhat_lower <= record.yhat && record.yhat <= record.yhat_upper);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod design;
pub mod engine;
pub mod error;
pub mod kpi;
pub mod metrics;
pub mod models;
pub mod output;
pub mod scenario;
pub mod simulation;
pub mod summary;

// Re-export commonly used types
pub use crate::config::{ForecastConfig, Method};
pub use crate::data::{DataSource, Observation, ObservationTable, SyntheticConfig};
pub use crate::design::{FeatureMatrix, Term, TermSpec};
pub use crate::engine::{forecast, run_forecast, ForecastRun, RunOptions};
pub use crate::error::{ForecastError, Result};
pub use crate::kpi::KpiSummary;
pub use crate::models::{BootstrapFitter, ConjugateFitter, FittedModel, Fitter};
pub use crate::scenario::ScenarioAssumption;
pub use crate::summary::ForecastRecord;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
