use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use revenue_forecast::data::{DataSource, ObservationTable, SyntheticConfig};
use revenue_forecast::design::{Term, TermSpec};
use revenue_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_load_full_table() {
    let file = write_csv(&[
        "date,t,promo,holiday,price_index,revenue",
        "2022-10-01,1,1,0,1.02,25000.5",
        "2022-11-01,2,1,1,0.98,31000",
        "2022-12-01,3,1,1,1.01,32000",
        "2023-01-01,4,1,0,1.00,27000",
    ]);

    let table = ObservationTable::from_csv(file.path()).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(TermSpec::for_table(&table), TermSpec::full());

    let first = &table.observations()[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2022, 10, 1).unwrap());
    assert_eq!(first.promo, Some(true));
    assert_eq!(first.holiday, Some(false));
    assert_eq!(first.price_index, Some(1.02));
    assert_eq!(table.revenue(), vec![25000.5, 31000.0, 32000.0, 27000.0]);
}

#[test]
fn test_load_original_column_names() {
    let file = write_csv(&[
        "Date,t,Promo,Holiday,PriceIndex,Revenue",
        "2022-01-01 00:00:00,1,1,0,1.0,21000",
        "2022-02-01 00:00:00,2,1,0,1.01,21500",
    ]);

    let table = ObservationTable::from_csv(file.path()).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.columns().price_index);
}

#[test]
fn test_missing_optional_columns_drop_terms() {
    let file = write_csv(&[
        "date,t,promo,revenue",
        "2022-01-01,1,1,21000",
        "2022-02-01,2,1,21500",
        "2022-03-01,3,0,20000",
    ]);

    let table = ObservationTable::from_csv(file.path()).unwrap();
    let terms = TermSpec::for_table(&table);
    assert_eq!(terms.terms(), &[Term::Intercept, Term::Trend, Term::Promo]);

    // Asking for a column the table lacks is a shape error
    let err = TermSpec::full().build(table.observations()).unwrap_err();
    assert!(matches!(err, ForecastError::ShapeError(_)));
}

#[test]
fn test_missing_required_column() {
    let file = write_csv(&["date,t,promo", "2022-01-01,1,1"]);
    let err = ObservationTable::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
    assert!(err.is_data_source());
}

#[test]
fn test_bad_values_are_data_source_errors() {
    let cases = [
        vec!["date,t,revenue", "2022-01-01,1,abc"],
        vec!["date,t,revenue", "01/01/2022,1,100"],
        vec!["date,t,promo,revenue", "2022-01-01,1,2,100"],
        vec!["date,t,revenue", "2022-01-01,1,100", "2022-02-01,3,100"],
        vec!["date,t,revenue", "2022-01-01,1,100", "2022-03-01,2,100"],
        vec!["date,t,price_index,revenue", "2022-01-01,1,0.0,100"],
        vec!["date,t,revenue"],
    ];

    for lines in &cases {
        let file = write_csv(lines);
        let err = ObservationTable::from_csv(file.path()).unwrap_err();
        assert!(err.is_data_source(), "{:?} gave {}", lines, err);
    }
}

#[test]
fn test_csv_round_trip() {
    let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let file = NamedTempFile::new().unwrap();

    table.to_csv(file.path()).unwrap();
    let loaded = ObservationTable::from_csv(file.path()).unwrap();
    assert_eq!(loaded, table);
}

#[test]
fn test_load_or_generate_falls_back() {
    let synthetic = SyntheticConfig::default();

    let (table, source) =
        ObservationTable::load_or_generate("/nonexistent/sales.csv", &synthetic).unwrap();
    assert_eq!(source, DataSource::Synthetic);
    assert_eq!(table.len(), 36);

    let malformed = write_csv(&["month,sales", "x,y"]);
    let (_, source) = ObservationTable::load_or_generate(malformed.path(), &synthetic).unwrap();
    assert_eq!(source, DataSource::Synthetic);
}

#[test]
fn test_load_or_generate_falls_back_on_time_index_overflow() {
    let file = write_csv(&[
        "date,t,revenue",
        "2023-05-01,4294967295,100",
        "2023-06-01,0,110",
    ]);

    let err = ObservationTable::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));

    let (table, source) =
        ObservationTable::load_or_generate(file.path(), &SyntheticConfig::default()).unwrap();
    assert_eq!(source, DataSource::Synthetic);
    assert_eq!(table.len(), 36);
}

#[test]
fn test_load_or_generate_prefers_csv() {
    let file = write_csv(&[
        "date,t,revenue",
        "2023-05-01,1,100",
        "2023-06-01,2,110",
    ]);

    let (table, source) =
        ObservationTable::load_or_generate(file.path(), &SyntheticConfig::default()).unwrap();
    assert_eq!(source, DataSource::Csv);
    assert_eq!(table.len(), 2);
}

#[test]
fn test_synthetic_seed_controls_history() {
    let a = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let b = ObservationTable::generate(&SyntheticConfig {
        seed: 11,
        ..SyntheticConfig::default()
    })
    .unwrap();

    assert_eq!(a.observations()[0].date, b.observations()[0].date);
    assert!(a.revenue() != b.revenue());
}
