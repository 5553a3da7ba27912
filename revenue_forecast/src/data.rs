//! Historical monthly observations for forecasting

use crate::design::Covariates;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use csv::StringRecord;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// One historical month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// First day of the calendar month
    pub date: NaiveDate,
    /// 1-based time index
    pub t: u32,
    /// Promotion flag, if the table carries one
    pub promo: Option<bool>,
    /// Holiday flag, if the table carries one
    pub holiday: Option<bool>,
    /// Price index centered near 1.0, if the table carries one
    pub price_index: Option<f64>,
    /// Observed revenue
    pub revenue: f64,
}

impl Covariates for Observation {
    fn t(&self) -> u32 {
        self.t
    }

    fn promo(&self) -> Option<bool> {
        self.promo
    }

    fn holiday(&self) -> Option<bool> {
        self.holiday
    }

    fn price_index(&self) -> Option<f64> {
        self.price_index
    }
}

/// Which optional columns a table carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnSet {
    pub promo: bool,
    pub holiday: bool,
    pub price_index: bool,
}

/// Validated, immutable snapshot of historical observations
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    observations: Vec<Observation>,
    columns: ColumnSet,
}

/// Where a loaded table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// True for the months the seasonal promotion rule covers (Oct through Feb)
pub fn promo_season(month: u32) -> bool {
    month >= 10 || month <= 2
}

/// True for the months the holiday rule covers (Nov and Dec)
pub fn holiday_season(month: u32) -> bool {
    month == 11 || month == 12
}

/// First day of the month following `date`
pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?.checked_add_months(Months::new(1))
}

fn month_ordinal(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

impl ObservationTable {
    /// Create a table, validating ordering and column consistency
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let first = observations
            .first()
            .ok_or_else(|| ForecastError::DataError("Observation table is empty".to_string()))?;

        let columns = ColumnSet {
            promo: first.promo.is_some(),
            holiday: first.holiday.is_some(),
            price_index: first.price_index.is_some(),
        };

        for (i, obs) in observations.iter().enumerate() {
            if obs.promo.is_some() != columns.promo
                || obs.holiday.is_some() != columns.holiday
                || obs.price_index.is_some() != columns.price_index
            {
                return Err(ForecastError::DataError(format!(
                    "Row {} does not carry the same optional columns as the first row",
                    i + 1
                )));
            }

            if !obs.revenue.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "Row {} has a non-finite revenue",
                    i + 1
                )));
            }

            if let Some(price) = obs.price_index {
                if !(price.is_finite() && price > 0.0) {
                    return Err(ForecastError::DataError(format!(
                        "Row {} has a non-positive price index {}",
                        i + 1,
                        price
                    )));
                }
            }
        }

        for pair in observations.windows(2) {
            let next = pair[0].t.checked_add(1).ok_or_else(|| {
                ForecastError::DataError(format!("Time index overflows after {}", pair[0].t))
            })?;
            if pair[1].t != next {
                return Err(ForecastError::DataError(format!(
                    "Time index must increase by one without gaps, found {} after {}",
                    pair[1].t, pair[0].t
                )));
            }
            if month_ordinal(pair[1].date) != month_ordinal(pair[0].date) + 1 {
                return Err(ForecastError::DataError(format!(
                    "Dates must advance one calendar month per row, found {} after {}",
                    pair[1].date, pair[0].date
                )));
            }
        }

        Ok(Self {
            observations,
            columns,
        })
    }

    /// Load a table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a table from any CSV source.
    ///
    /// Header names are matched case-insensitively and ignoring underscores,
    /// so both `price_index` and `PriceIndex` are accepted. `date`, `t` and
    /// `revenue` are required; `promo`, `holiday` and `price_index` are
    /// optional.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let layout = ColumnLayout::detect(&headers)?;

        let mut observations = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            observations.push(layout.parse(&record, i + 1)?);
        }

        debug!(rows = observations.len(), "loaded observation table from csv");
        Self::new(observations)
    }

    /// Generate a synthetic table from a known data generating process
    pub fn generate(config: &SyntheticConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let noise = Normal::new(0.0, config.sigma)
            .map_err(|e| ForecastError::InvalidParameter(format!("Noise sigma: {}", e)))?;

        let n = config.months;
        let t_mean = (n as f64 + 1.0) / 2.0;
        let mut date = config.start.with_day(1).ok_or_else(|| {
            ForecastError::InvalidParameter(format!("Invalid start date {}", config.start))
        })?;

        let mut observations = Vec::with_capacity(n);
        for i in 0..n {
            let t = (i + 1) as u32;
            let tf = t as f64;
            let promo = promo_season(date.month());
            let holiday = holiday_season(date.month());
            let price = 1.0 + 0.01 * (tf - t_mean) + 0.03 * (2.0 * PI * tf / 12.0).sin();

            let mut revenue = config.intercept + config.trend * tf;
            if promo {
                revenue += config.promo_effect;
            }
            if config.include_holiday && holiday {
                revenue += config.holiday_effect;
            }
            if config.include_price {
                revenue += config.price_effect * (price - 1.0);
            }
            revenue += noise.sample(&mut rng);

            observations.push(Observation {
                date,
                t,
                promo: Some(promo),
                holiday: config.include_holiday.then_some(holiday),
                price_index: config.include_price.then_some(price),
                revenue,
            });

            date = next_month_start(date).ok_or_else(|| {
                ForecastError::DataError(format!("Calendar overflow after {}", date))
            })?;
        }

        Self::new(observations)
    }

    /// Load the CSV at `path`, or generate synthetic data if it is absent or malformed.
    ///
    /// Only data-source failures trigger the fallback.
    pub fn load_or_generate<P: AsRef<Path>>(
        path: P,
        synthetic: &SyntheticConfig,
    ) -> Result<(Self, DataSource)> {
        let path = path.as_ref();
        match Self::from_csv(path) {
            Ok(table) => Ok((table, DataSource::Csv)),
            Err(err) if err.is_data_source() => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "falling back to synthetic observations"
                );
                Ok((Self::generate(synthetic)?, DataSource::Synthetic))
            }
            Err(err) => Err(err),
        }
    }

    /// Write the table as CSV with the canonical column names
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        let mut header = vec!["date", "t"];
        if self.columns.promo {
            header.push("promo");
        }
        if self.columns.holiday {
            header.push("holiday");
        }
        if self.columns.price_index {
            header.push("price_index");
        }
        header.push("revenue");
        wtr.write_record(&header)?;

        for obs in &self.observations {
            let mut row = vec![obs.date.to_string(), obs.t.to_string()];
            if let Some(promo) = obs.promo {
                row.push(u8::from(promo).to_string());
            }
            if let Some(holiday) = obs.holiday {
                row.push(u8::from(holiday).to_string());
            }
            if let Some(price) = obs.price_index {
                row.push(price.to_string());
            }
            row.push(obs.revenue.to_string());
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// All observations in time order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Optional columns present in this table
    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    /// Revenue as a response vector
    pub fn revenue(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.revenue).collect()
    }

    /// Most recent observation
    pub fn last(&self) -> &Observation {
        // Construction guarantees at least one row
        &self.observations[self.observations.len() - 1]
    }

    /// Get the number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Column positions found in a CSV header
#[derive(Debug)]
struct ColumnLayout {
    date: usize,
    t: usize,
    promo: Option<usize>,
    holiday: Option<usize>,
    price_index: Option<usize>,
    revenue: usize,
}

impl ColumnLayout {
    fn detect(headers: &StringRecord) -> Result<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.to_lowercase().replace('_', "") == wanted)
        };
        let require = |wanted: &str| {
            find(wanted).ok_or_else(|| {
                ForecastError::DataError(format!("Required column '{}' not found", wanted))
            })
        };

        Ok(Self {
            date: require("date")?,
            t: require("t")?,
            promo: find("promo"),
            holiday: find("holiday"),
            price_index: find("priceindex"),
            revenue: require("revenue")?,
        })
    }

    fn parse(&self, record: &StringRecord, row: usize) -> Result<Observation> {
        let field = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                ForecastError::DataError(format!("Row {} is missing column {}", row, idx + 1))
            })
        };

        let raw_date = field(self.date)?;
        // Accept timestamps such as "2022-01-01 00:00:00" by reading the date part
        let date = NaiveDate::parse_from_str(raw_date.get(..10).unwrap_or(raw_date), "%Y-%m-%d")?;

        let t: u32 = field(self.t)?.parse()?;
        let revenue: f64 = field(self.revenue)?.parse()?;

        let promo = self
            .promo
            .map(|idx| parse_flag(field(idx)?, "promo", row))
            .transpose()?;
        let holiday = self
            .holiday
            .map(|idx| parse_flag(field(idx)?, "holiday", row))
            .transpose()?;
        let price_index = self
            .price_index
            .map(|idx| field(idx)?.parse::<f64>().map_err(ForecastError::from))
            .transpose()?;

        Ok(Observation {
            date,
            t,
            promo,
            holiday,
            price_index,
            revenue,
        })
    }
}

fn parse_flag(raw: &str, name: &str, row: usize) -> Result<bool> {
    match raw {
        "1" | "1.0" | "true" | "True" => Ok(true),
        "0" | "0.0" | "false" | "False" => Ok(false),
        other => Err(ForecastError::DataError(format!(
            "Row {}: '{}' must be 0 or 1, got '{}'",
            row, name, other
        ))),
    }
}

/// Parameters of the synthetic data generating process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub start: NaiveDate,
    pub months: usize,
    pub seed: u64,
    pub intercept: f64,
    pub trend: f64,
    pub promo_effect: f64,
    pub holiday_effect: f64,
    pub price_effect: f64,
    pub sigma: f64,
    /// Emit the holiday column and its effect
    pub include_holiday: bool,
    /// Emit the price index column and its effect
    pub include_price: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            months: 36,
            seed: 10,
            intercept: 21000.0,
            trend: 330.0,
            promo_effect: 1800.0,
            holiday_effect: 2500.0,
            price_effect: -4000.0,
            sigma: 3600.0,
            include_holiday: true,
            include_price: true,
        }
    }
}

impl SyntheticConfig {
    /// Trend and promotion only, without holiday or price columns
    pub fn trend_promo() -> Self {
        Self {
            seed: 7,
            intercept: 20000.0,
            trend: 350.0,
            promo_effect: 1500.0,
            sigma: 3500.0,
            include_holiday: false,
            include_price: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.months == 0 {
            return Err(ForecastError::InvalidParameter(
                "Synthetic table needs at least one month".to_string(),
            ));
        }
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Noise sigma must be non-negative, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}
