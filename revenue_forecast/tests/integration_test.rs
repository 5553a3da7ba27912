use approx::assert_relative_eq;
use nalgebra::DVector;
use pretty_assertions::assert_eq;
use revenue_forecast::data::{Observation, ObservationTable, SyntheticConfig};
use revenue_forecast::engine::{forecast, ForecastRun, RunOptions};
use revenue_forecast::models::{BootstrapFitter, ConjugateFitter, Fitter};
use revenue_forecast::scenario::{ScenarioAssumption, ScenarioPeriod};
use revenue_forecast::TermSpec;

const TRUE_BETA: [f64; 5] = [21000.0, 330.0, 1800.0, 2500.0, -4000.0];
const TRUE_SIGMA: f64 = 3600.0;

fn expected_revenue(period: &ScenarioPeriod) -> f64 {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    TRUE_BETA[0]
        + TRUE_BETA[1] * period.t as f64
        + TRUE_BETA[2] * flag(period.promo)
        + TRUE_BETA[3] * flag(period.holiday)
        + TRUE_BETA[4] * (period.price_index - 1.0)
}

// 36 months from the reference process whose noise is orthogonal to every
// design column and has a residual standard deviation of exactly 3600, so
// least squares recovers the true coefficients. On seeded random noise the
// fitted coefficients carry their own sampling error, and the first-month
// mean lands about 1800 from the truth, outside the 2σ/√n tolerance used
// here. Bands on random history are checked in
// test_true_mean_inside_bands_on_random_history.
fn orthogonal_noise_table() -> ObservationTable {
    let noise_free = ObservationTable::generate(&SyntheticConfig {
        sigma: 0.0,
        ..SyntheticConfig::default()
    })
    .unwrap();

    let x = TermSpec::full().build(noise_free.observations()).unwrap();
    let x = x.values();
    let n = x.nrows();
    let k = x.ncols();

    let raw = DVector::from_iterator(n, (0..n).map(|i| ((i * 7919) % 101) as f64 - 50.0));
    let xtx = x.transpose() * x;
    let coef = xtx.cholesky().unwrap().solve(&(x.transpose() * &raw));
    let residual = &raw - x * coef;

    let scale = (TRUE_SIGMA * TRUE_SIGMA * (n - k) as f64 / residual.norm_squared()).sqrt();
    let noise = residual * scale;

    let observations: Vec<Observation> = noise_free
        .observations()
        .iter()
        .zip(noise.iter())
        .map(|(obs, e)| Observation {
            revenue: obs.revenue + e,
            ..obs.clone()
        })
        .collect();
    ObservationTable::new(observations).unwrap()
}

fn run(table: &ObservationTable, fitter: &dyn Fitter, seed: u64) -> ForecastRun {
    let options = RunOptions {
        draws: 1000,
        seed,
        ..Default::default()
    };
    forecast(table, fitter, &ScenarioAssumption::default(), &options).unwrap()
}

#[test]
fn test_reference_example_first_month() {
    let table = orthogonal_noise_table();
    let fitters: Vec<Box<dyn Fitter>> = vec![
        Box::new(ConjugateFitter::default()),
        Box::new(BootstrapFitter::new()),
    ];

    for fitter in &fitters {
        let run = run(&table, fitter.as_ref(), 1);
        assert_eq!(run.records.len(), 6);

        let first = &run.records[0];
        let period = first.scenario.unwrap();
        assert_eq!(period.t, 37);
        assert!(period.promo);
        assert!(!period.holiday);

        // Within 2σ/√n of the true expected revenue
        let tolerance = 2.0 * TRUE_SIGMA / (table.len() as f64).sqrt();
        assert!(
            (first.yhat - expected_revenue(&period)).abs() < tolerance,
            "{}: yhat {} vs expected {}",
            fitter.name(),
            first.yhat,
            expected_revenue(&period)
        );

        for record in &run.records {
            assert!(record.yhat_lower <= record.yhat);
            assert!(record.yhat <= record.yhat_upper);
            let width = record.interval_width();
            assert!(width > 10_000.0 && width < 20_000.0, "width {}", width);
        }
    }
}

#[test]
fn test_bootstrap_recovers_reference_coefficients() {
    let table = orthogonal_noise_table();
    let run = run(&table, &BootstrapFitter::new(), 1);

    for ((_, estimate), truth) in run.coefficients.iter().zip(TRUE_BETA.iter()) {
        assert_relative_eq!(*estimate, *truth, epsilon = 1e-4, max_relative = 1e-8);
    }
}

#[test]
fn test_true_mean_inside_bands_on_random_history() {
    let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let fitters: Vec<Box<dyn Fitter>> = vec![
        Box::new(ConjugateFitter::default()),
        Box::new(BootstrapFitter::new()),
    ];

    for fitter in &fitters {
        let run = run(&table, fitter.as_ref(), 3);
        for record in &run.records {
            let truth = expected_revenue(&record.scenario.unwrap());
            assert!(record.yhat_lower < truth && truth < record.yhat_upper);
        }
    }
}

#[test]
fn test_same_seed_same_records() {
    let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let fitter = ConjugateFitter::default();

    let a = run(&table, &fitter, 11);
    let b = run(&table, &fitter, 11);
    assert_eq!(a.records, b.records);

    let c = run(&table, &fitter, 12);
    assert!(a.records != c.records);
}

#[test]
fn test_single_month_horizon() {
    let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let assumption = ScenarioAssumption {
        horizon: 1,
        ..Default::default()
    };
    let run = forecast(
        &table,
        &BootstrapFitter::new(),
        &assumption,
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.periods.len(), 1);
}

#[test]
fn test_disabled_policies() {
    let table = ObservationTable::generate(&SyntheticConfig::default()).unwrap();
    let assumption = ScenarioAssumption {
        horizon: 12,
        promo_policy: false,
        holiday_policy: false,
        price_step: 0.0,
    };
    let run = forecast(
        &table,
        &ConjugateFitter::default(),
        &assumption,
        &RunOptions::default(),
    )
    .unwrap();

    assert!(run.periods.iter().all(|p| !p.promo && !p.holiday));
    let last_price = table.last().price_index.unwrap();
    assert!(run.periods.iter().all(|p| p.price_index == last_price));
}

#[test]
fn test_trend_promo_history() {
    let table = ObservationTable::generate(&SyntheticConfig::trend_promo()).unwrap();
    let run = forecast(
        &table,
        &ConjugateFitter::default(),
        &ScenarioAssumption::default(),
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!(run.terms, TermSpec::trend_promo());
    let names: Vec<&str> = run.coefficients.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["intercept", "t", "promo"]);
}
