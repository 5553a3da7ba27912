//! # Revenue Forecast Workspace
//!
//! Umbrella crate for the revenue forecasting workspace.
//!
//! - [`forecast_math`]: descriptive statistics and ensemble percentiles
//! - [`revenue_forecast`]: observation tables, model fitting, scenarios and forecast tables
//!
//! ## Example
//!
//! ```
//! use revenue_forecast_workspace::forecast_math::percentile;
//!
//! let median = percentile(&[1.0, 2.0, 3.0, 4.0], 0.5).unwrap();
//! assert_eq!(median, 2.5);
//! ```

pub use forecast_math;
pub use revenue_forecast;
