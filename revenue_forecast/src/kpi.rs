//! Aggregate figures over a persisted forecast table

use crate::summary::ForecastRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Select records for one series (or all when `None`) within an inclusive date range
pub fn filter_records<'a>(
    records: &'a [ForecastRecord],
    series: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<&'a ForecastRecord> {
    records
        .iter()
        .filter(|r| series.map_or(true, |s| r.product == s))
        .filter(|r| start.map_or(true, |d| r.date >= d))
        .filter(|r| end.map_or(true, |d| r.date <= d))
        .collect()
}

/// Headline figures for a selection of forecast records
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KpiSummary {
    pub periods: usize,
    /// Sum of forecast means
    pub total_forecast: f64,
    /// Mean width of the credible band
    pub avg_interval_width: f64,
    /// Sum of upper bounds
    pub total_upside: f64,
    /// Sum of lower bounds
    pub total_downside: f64,
}

impl KpiSummary {
    /// Aggregate the selection; an empty selection gives all zeros
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ForecastRecord>,
    {
        let mut summary = Self::default();
        let mut width_sum = 0.0;
        for r in records {
            summary.periods += 1;
            summary.total_forecast += r.yhat;
            summary.total_upside += r.yhat_upper;
            summary.total_downside += r.yhat_lower;
            width_sum += r.interval_width();
        }
        if summary.periods > 0 {
            summary.avg_interval_width = width_sum / summary.periods as f64;
        }
        summary
    }

    /// One-paragraph reading of the range for ordering decisions
    pub fn insight(&self, series: Option<&str>) -> String {
        if self.periods == 0 {
            return "No forecast periods match this selection.".to_string();
        }
        format!(
            "For {} in this date range, expected revenue is about {}, with a credible \
             range from {} to {}. Planning toward the upper bound reduces stockout risk, \
             while planning toward the lower bound limits overstock.",
            series.unwrap_or("the selected series"),
            group_thousands(self.total_forecast),
            group_thousands(self.total_downside),
            group_thousands(self.total_upside),
        )
    }
}

impl fmt::Display for KpiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast KPIs ({} periods):", self.periods)?;
        writeln!(f, "  Total forecast:      {}", group_thousands(self.total_forecast))?;
        writeln!(f, "  Avg interval width:  {:.1}", self.avg_interval_width)?;
        writeln!(f, "  Total upside:        {}", group_thousands(self.total_upside))?;
        writeln!(f, "  Total downside:      {}", group_thousands(self.total_downside))?;
        Ok(())
    }
}

/// Round to a whole number and separate thousands with commas
fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, c) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
