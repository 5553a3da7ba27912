use clap::{Parser, ValueEnum};
use revenue_forecast::config::{ForecastConfig, Method};
use revenue_forecast::data::{DataSource, ObservationTable, SyntheticConfig};
use revenue_forecast::engine::run_forecast;
use revenue_forecast::kpi::KpiSummary;
use revenue_forecast::output::{write_forecast_csv, write_forecast_json, write_scenario_csv};
use revenue_forecast::{Result, TermSpec};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Conjugate,
    Bootstrap,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Conjugate => Method::Conjugate,
            MethodArg::Bootstrap => Method::Bootstrap,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Probabilistic monthly revenue forecasts", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Historical observations; synthetic data is used if absent or unreadable
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Forecast results table
    #[arg(short, long, default_value = "data/forecast_results.csv")]
    output: PathBuf,

    /// Optional scenario table with the simulated covariates
    #[arg(long)]
    scenario_output: Option<PathBuf>,

    /// Optional JSON copy of the forecast records
    #[arg(long)]
    json_output: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    method: Option<MethodArg>,

    /// Number of future months
    #[arg(long)]
    horizon: Option<usize>,

    /// Monthly change in the price index
    #[arg(long, allow_hyphen_values = true)]
    price_step: Option<f64>,

    /// Disable the Oct through Feb promotion rule
    #[arg(long)]
    no_promo: bool,

    /// Disable the Nov and Dec holiday rule
    #[arg(long)]
    no_holiday: bool,

    /// Number of simulated trajectories
    #[arg(long)]
    draws: Option<usize>,

    /// Simulation seed
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    /// Load the configuration file and let flags override it
    fn resolve_config(&self) -> Result<ForecastConfig> {
        let mut config = match &self.config {
            Some(path) => ForecastConfig::from_file(path)?,
            None => ForecastConfig::default(),
        };

        if let Some(method) = self.method {
            config.method = method.into();
        }
        if let Some(horizon) = self.horizon {
            config.scenario.horizon = horizon;
        }
        if let Some(step) = self.price_step {
            config.scenario.price_step = step;
        }
        if self.no_promo {
            config.scenario.promo_policy = false;
        }
        if self.no_holiday {
            config.scenario.holiday_policy = false;
        }
        if let Some(draws) = self.draws {
            config.draws = draws;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.resolve_config()?;

    let synthetic = SyntheticConfig {
        seed: config.data_seed,
        ..SyntheticConfig::default()
    };
    let (table, source) = match &args.input {
        Some(path) => ObservationTable::load_or_generate(path, &synthetic)?,
        None => (ObservationTable::generate(&synthetic)?, DataSource::Synthetic),
    };
    info!(rows = table.len(), source = ?source, method = %config.method, "Loaded history");

    let fitter = config.fitter()?;
    let terms = TermSpec::for_table(&table);
    let run = run_forecast(
        &table,
        fitter.as_ref(),
        &terms,
        &config.scenario.to_assumption(),
        &config.run_options(),
    )?;

    ensure_parent_dir(&args.output)?;
    write_forecast_csv(&args.output, &run.records)?;
    info!(path = %args.output.display(), "Wrote forecast table");

    if let Some(path) = &args.scenario_output {
        ensure_parent_dir(path)?;
        write_scenario_csv(path, &run.records)?;
        info!(path = %path.display(), "Wrote scenario table");
    }

    if let Some(path) = &args.json_output {
        ensure_parent_dir(path)?;
        write_forecast_json(path, &run.records)?;
        info!(path = %path.display(), "Wrote forecast json");
    }

    println!("Model: {}", run.model_name);
    for (name, value) in &run.coefficients {
        println!("  {:<22} {:>12.2}", name, value);
    }
    println!();
    print!("{}", run.diagnostics);
    println!();

    let kpi = KpiSummary::from_records(&run.records);
    print!("{}", kpi);
    println!();
    println!("{}", kpi.insight(Some(&config.product)));

    Ok(())
}
