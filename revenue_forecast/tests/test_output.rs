use approx::assert_relative_eq;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use revenue_forecast::data::{ObservationTable, SyntheticConfig};
use revenue_forecast::engine::{forecast, RunOptions};
use revenue_forecast::kpi::{filter_records, KpiSummary};
use revenue_forecast::models::ConjugateFitter;
use revenue_forecast::output::{read_forecast_csv, write_forecast_csv, write_scenario_csv};
use revenue_forecast::scenario::ScenarioAssumption;
use tempfile::tempdir;

fn records() -> Vec<revenue_forecast::ForecastRecord> {
    let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let assumption = ScenarioAssumption {
        horizon: 12,
        ..Default::default()
    };
    let options = RunOptions {
        draws: 500,
        ..Default::default()
    };
    forecast(&table, &ConjugateFitter::default(), &assumption, &options)
        .unwrap()
        .records
}

#[test]
fn test_forecast_table_round_trip() {
    let records = records();
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_results.csv");

    write_forecast_csv(&path, &records).unwrap();
    let loaded = read_forecast_csv(&path).unwrap();

    assert_eq!(loaded.len(), 12);
    for (a, b) in loaded.iter().zip(records.iter()) {
        assert_eq!(a.date, b.date);
        assert_eq!(a.product, b.product);
        assert_eq!(a.yhat, b.yhat);
        assert_eq!(a.yhat_lower, b.yhat_lower);
        assert_eq!(a.yhat_upper, b.yhat_upper);
    }
    assert!(loaded.windows(2).all(|w| w[0].date < w[1].date));
}

#[test]
fn test_scenario_table_rows() {
    let records = records();
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_table.csv");

    write_scenario_csv(&path, &records).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 13);
    assert_eq!(
        lines[0],
        "month,forecast_mean,ci_lower,ci_upper,promo,holiday,price_index"
    );
    // Jan 2025 is a promotion month outside the holiday season
    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first[0], "2025-01-01");
    assert_eq!(first[4], "1");
    assert_eq!(first[5], "0");
    // Nov 2025 carries both flags
    let november: Vec<&str> = lines[11].split(',').collect();
    assert_eq!(november[0], "2025-11-01");
    assert_eq!(&november[4..6], &["1", "1"]);
}

#[test]
fn test_kpis_over_persisted_table() {
    let records = records();
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_results.csv");
    write_forecast_csv(&path, &records).unwrap();
    let loaded = read_forecast_csv(&path).unwrap();

    let all = KpiSummary::from_records(&loaded);
    assert_eq!(all.periods, 12);
    assert_relative_eq!(
        all.total_forecast,
        records.iter().map(|r| r.yhat).sum::<f64>(),
        max_relative = 1e-12
    );
    assert!(all.total_downside < all.total_forecast);
    assert!(all.total_forecast < all.total_upside);
    assert!(all.avg_interval_width > 0.0);

    let q1 = filter_records(
        &loaded,
        Some("Total Revenue"),
        NaiveDate::from_ymd_opt(2025, 1, 1),
        NaiveDate::from_ymd_opt(2025, 3, 1),
    );
    assert_eq!(KpiSummary::from_records(q1).periods, 3);

    let other = filter_records(&loaded, Some("Store 9"), None, None);
    let empty = KpiSummary::from_records(other);
    assert_eq!(empty, KpiSummary::default());
}
