use std::path::PathBuf;

use anyhow::{Context, Result};
use batteryopt::general::{DEFAULT_MARKET, load_inputs, print_dispatch_summary, write_dispatch_csv};
use batteryopt::milp::parameters::{DEFAULT_HORIZON, DEFAULT_PRICE_SEED, Horizon};
use batteryopt::{ArbitrageModel, ParameterSet, SolverBackend};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batteryopt")]
#[command(about = "Schedule a grid battery against market prices", long_about = None)]
struct Cli {
    /// Directory holding battery_parameters.csv, market_prices.csv and price_thresholds.csv
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Price column of market_prices.csv
    #[arg(short, long, default_value = DEFAULT_MARKET)]
    market: String,

    /// Seed for the generated prices when no data directory is given
    #[arg(long, default_value_t = DEFAULT_PRICE_SEED)]
    seed: u64,

    /// Number of generated periods when no data directory is given
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    periods: usize,

    /// MILP backend
    #[arg(long, default_value_t = SolverBackend::default())]
    solver: SolverBackend,

    /// Write the per-period dispatch to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let params = match &cli.data_dir {
        Some(dir) => load_inputs(dir, &cli.market)
            .with_context(|| format!("Failed to load inputs from {}", dir.display()))?,
        None => {
            let mut params = ParameterSet::new(Horizon::new(cli.periods)?);
            params.fill_random_prices(cli.seed);
            tracing::info!(periods = cli.periods, seed = cli.seed, "using generated prices");
            params
        }
    };

    let model = ArbitrageModel::new(params);
    let dispatch = model
        .solve(cli.solver)
        .with_context(|| format!("Optimization with {} failed", cli.solver))?;

    for violation in dispatch.verify(model.params()) {
        tracing::warn!("dispatch check: {}", violation);
    }

    print_dispatch_summary(&dispatch);

    if let Some(path) = &cli.output {
        write_dispatch_csv(path, &dispatch)?;
        println!("Dispatch saved as {}", path.display());
    }

    Ok(())
}
