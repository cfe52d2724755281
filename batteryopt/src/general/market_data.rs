use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::milp::{Horizon, ParameterSet};

pub const BATTERY_PARAMETERS_FILE: &str = "battery_parameters.csv";
pub const MARKET_PRICES_FILE: &str = "market_prices.csv";
pub const PRICE_THRESHOLDS_FILE: &str = "price_thresholds.csv";
/// Market column used when none is requested
pub const DEFAULT_MARKET: &str = "m1";

#[derive(Debug, Deserialize)]
struct ParameterRow {
    parameter: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ThresholdRow {
    parameter: String,
    price: f64,
}

/// Reads `parameter,value` rows into the battery scalars of `params`.
///
/// Rows naming an unknown parameter are skipped with a warning.
/// Returns the number of parameters applied.
pub fn load_battery_parameters(file_path: &Path, params: &mut ParameterSet) -> Result<usize> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let mut applied = 0;
    for (line_num, row) in reader.deserialize::<ParameterRow>().enumerate() {
        let row = row.with_context(|| {
            format!("Failed to parse row {} of {}", line_num + 1, file_path.display())
        })?;
        applied += apply_scalar(params, &row.parameter, row.value, file_path);
    }
    Ok(applied)
}

/// Reads `parameter,price` rows into the price thresholds of `params`.
pub fn load_price_thresholds(file_path: &Path, params: &mut ParameterSet) -> Result<usize> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let mut applied = 0;
    for (line_num, row) in reader.deserialize::<ThresholdRow>().enumerate() {
        let row = row.with_context(|| {
            format!("Failed to parse row {} of {}", line_num + 1, file_path.display())
        })?;
        applied += apply_scalar(params, &row.parameter, row.price, file_path);
    }
    Ok(applied)
}

fn apply_scalar(params: &mut ParameterSet, name: &str, value: f64, source: &Path) -> usize {
    match params.set_named(name, value) {
        Ok(()) => 1,
        Err(e) => {
            tracing::warn!(file = %source.display(), "skipping row: {}", e);
            0
        }
    }
}

/// Reads a `time,<market>,...` price table into `(time, price)` pairs for one market column.
pub fn load_market_prices(file_path: &Path, market: &str) -> Result<Vec<(usize, f64)>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", file_path.display()))?
        .clone();
    let time_column = headers
        .iter()
        .position(|h| h.trim() == "time")
        .ok_or_else(|| anyhow!("{} has no 'time' column", file_path.display()))?;
    let price_column = headers
        .iter()
        .position(|h| h.trim() == market)
        .ok_or_else(|| anyhow!("{} has no '{}' column", file_path.display(), market))?;

    let mut prices = Vec::new();
    for (line_num, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read line {}", line_num + 2))?;
        let time = record
            .get(time_column)
            .unwrap_or_default()
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Failed to parse time on line {}", line_num + 2))?;
        let price = record
            .get(price_column)
            .unwrap_or_default()
            .trim()
            .parse::<f64>()
            .with_context(|| {
                format!("Failed to parse {} price on line {}", market, line_num + 2)
            })?;
        prices.push((time, price));
    }
    Ok(prices)
}

/// Builds a parameter set from the three input files in `data_dir`.
///
/// The horizon is the number of price rows; the market column feeds both the
/// charge and the discharge price of every period.
pub fn load_inputs(data_dir: &Path, market: &str) -> Result<ParameterSet> {
    let prices = load_market_prices(&data_dir.join(MARKET_PRICES_FILE), market)?;
    let horizon = Horizon::new(prices.len())
        .with_context(|| format!("No price rows in {}", MARKET_PRICES_FILE))?;

    let mut params = ParameterSet::new(horizon);
    load_battery_parameters(&data_dir.join(BATTERY_PARAMETERS_FILE), &mut params)?;
    // as many rows as periods, so rejecting repeats also rules out gaps
    let mut seen = vec![false; horizon.len()];
    for (time, price) in prices {
        let slot = horizon
            .position(time)
            .with_context(|| format!("Invalid row in {}", MARKET_PRICES_FILE))?;
        if std::mem::replace(&mut seen[slot], true) {
            bail!("Duplicate time {} in {}", time, MARKET_PRICES_FILE);
        }
        params
            .set_price(time, price)
            .with_context(|| format!("Invalid row in {}", MARKET_PRICES_FILE))?;
    }
    load_price_thresholds(&data_dir.join(PRICE_THRESHOLDS_FILE), &mut params)?;

    tracing::info!(
        periods = horizon.len(),
        market,
        dir = %data_dir.display(),
        "loaded input data"
    );
    Ok(params)
}
