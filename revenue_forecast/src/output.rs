//! Persisted forecast tables
//!
//! Two tables are written:
//! - the forecast results table (`date,product,yhat,yhat_lower,yhat_upper`),
//!   the contract the dashboard reads;
//! - the scenario table, which adds the covariates each month was simulated with.
//!
//! Records can also be exported as a JSON array for other consumers.

use crate::error::{ForecastError, Result};
use crate::summary::ForecastRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;

/// Write forecast records to any CSV sink in ascending date order
pub fn write_forecast<W: Write>(writer: W, records: &[ForecastRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in sorted_by_date(records) {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the forecast results table to a file
pub fn write_forecast_csv<P: AsRef<Path>>(path: P, records: &[ForecastRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_forecast(file, records)
}

/// Read a forecast results table
pub fn read_forecast<R: Read>(reader: R) -> Result<Vec<ForecastRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<ForecastRecord>, csv::Error>>()?;
    Ok(records)
}

/// Read a forecast results table from a file
pub fn read_forecast_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ForecastRecord>> {
    let file = std::fs::File::open(path)?;
    read_forecast(file)
}

/// Write forecast records as a pretty-printed JSON array in ascending date order
pub fn write_forecast_json<P: AsRef<Path>>(path: P, records: &[ForecastRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &sorted_by_date(records))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ScenarioRow {
    month: NaiveDate,
    forecast_mean: f64,
    ci_lower: f64,
    ci_upper: f64,
    promo: u8,
    holiday: u8,
    price_index: f64,
}

/// Write the scenario table; every record must carry its scenario covariates
pub fn write_scenario<W: Write>(writer: W, records: &[ForecastRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in sorted_by_date(records) {
        let scenario = record.scenario.ok_or_else(|| {
            ForecastError::DataError(format!(
                "Record for {} has no scenario covariates",
                record.date
            ))
        })?;
        wtr.serialize(ScenarioRow {
            month: record.date,
            forecast_mean: record.yhat,
            ci_lower: record.yhat_lower,
            ci_upper: record.yhat_upper,
            promo: u8::from(scenario.promo),
            holiday: u8::from(scenario.holiday),
            price_index: scenario.price_index,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the scenario table to a file
pub fn write_scenario_csv<P: AsRef<Path>>(path: P, records: &[ForecastRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_scenario(file, records)
}

fn sorted_by_date(records: &[ForecastRecord]) -> Vec<&ForecastRecord> {
    let mut sorted: Vec<&ForecastRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);
    sorted
}
