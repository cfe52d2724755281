use std::ops::RangeInclusive;
use std::str::FromStr;

use battery_model::{BatteryParams, PriceThresholds};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ModelError, PriceSeries};

/// Number of hourly periods in the reference horizon
pub const DEFAULT_HORIZON: usize = 24;
/// Seed of the generated default price series
pub const DEFAULT_PRICE_SEED: u64 = 42;

/// Ordered periods `1..=N` every indexed entity is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    periods: usize,
}

impl Horizon {
    pub fn new(periods: usize) -> Result<Self, ModelError> {
        if periods == 0 {
            return Err(ModelError::EmptyHorizon);
        }
        Ok(Self { periods })
    }

    pub fn len(&self) -> usize {
        self.periods
    }

    /// Always `false`: `new` rejects an empty horizon. Kept alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.periods == 0
    }

    pub fn periods(&self) -> RangeInclusive<usize> {
        1..=self.periods
    }

    pub fn contains(&self, period: usize) -> bool {
        (1..=self.periods).contains(&period)
    }

    /// Zero-based position of `period`, or `UnknownPeriod` when it is outside the horizon.
    pub fn position(&self, period: usize) -> Result<usize, ModelError> {
        if self.contains(period) {
            Ok(period - 1)
        } else {
            Err(ModelError::UnknownPeriod {
                period,
                horizon: self.periods,
            })
        }
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self {
            periods: DEFAULT_HORIZON,
        }
    }
}

/// Scalar parameters addressable by their external key names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarParameter {
    StorageCapacity,
    PowerRating,
    ChargingEff,
    DischargingEff,
    InitialSoc,
    ChMaxThreshold,
    DischMinThreshold,
}

impl ScalarParameter {
    pub const ALL: [ScalarParameter; 7] = [
        ScalarParameter::StorageCapacity,
        ScalarParameter::PowerRating,
        ScalarParameter::ChargingEff,
        ScalarParameter::DischargingEff,
        ScalarParameter::InitialSoc,
        ScalarParameter::ChMaxThreshold,
        ScalarParameter::DischMinThreshold,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarParameter::StorageCapacity => "storage_capacity",
            ScalarParameter::PowerRating => "power_rating",
            ScalarParameter::ChargingEff => "charging_eff",
            ScalarParameter::DischargingEff => "discharging_eff",
            ScalarParameter::InitialSoc => "initial_soc",
            ScalarParameter::ChMaxThreshold => "ch_max_threshold",
            ScalarParameter::DischMinThreshold => "disch_min_threshold",
        }
    }
}

impl FromStr for ScalarParameter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarParameter::ALL
            .into_iter()
            .find(|param| param.name() == s.trim())
            .ok_or_else(|| ModelError::UnknownParameter(s.to_string()))
    }
}

/// Typed inputs of one scheduling problem.
///
/// Everything is mutable in place so externally loaded data can overwrite the
/// defaults before a [`Formulation`](crate::milp::Formulation) is built. The
/// horizon itself is fixed at construction. Values are not validated: a
/// negative capacity or a zero efficiency only shows up as infeasibility or
/// nonsensical bounds at solve time.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    horizon: Horizon,
    pub battery: BatteryParams,
    pub thresholds: PriceThresholds,
    charge_price: IndexMap<usize, f64>,
    discharge_price: IndexMap<usize, f64>,
}

impl Default for ParameterSet {
    /// Reference setup: 24 periods, default battery and thresholds, seeded random prices.
    fn default() -> Self {
        let mut params = Self::new(Horizon::default());
        params.fill_random_prices(DEFAULT_PRICE_SEED);
        params
    }
}

impl ParameterSet {
    /// Default battery and thresholds over `horizon`, with no prices set yet.
    pub fn new(horizon: Horizon) -> Self {
        Self {
            horizon,
            battery: BatteryParams::default(),
            thresholds: PriceThresholds::default(),
            charge_price: IndexMap::with_capacity(horizon.len()),
            discharge_price: IndexMap::with_capacity(horizon.len()),
        }
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Overwrites both price series with integer prices drawn uniformly from [-5, 15).
    pub fn fill_random_prices(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for t in self.horizon.periods() {
            let price = rng.gen_range(-5..15) as f64;
            self.charge_price.insert(t, price);
            self.discharge_price.insert(t, price);
        }
    }

    pub fn scalar(&self, param: ScalarParameter) -> f64 {
        match param {
            ScalarParameter::StorageCapacity => self.battery.storage_capacity,
            ScalarParameter::PowerRating => self.battery.power_rating,
            ScalarParameter::ChargingEff => self.battery.charging_eff,
            ScalarParameter::DischargingEff => self.battery.discharging_eff,
            ScalarParameter::InitialSoc => self.battery.initial_soc,
            ScalarParameter::ChMaxThreshold => self.thresholds.ch_max_threshold,
            ScalarParameter::DischMinThreshold => self.thresholds.disch_min_threshold,
        }
    }

    pub fn set_scalar(&mut self, param: ScalarParameter, value: f64) {
        let slot = match param {
            ScalarParameter::StorageCapacity => &mut self.battery.storage_capacity,
            ScalarParameter::PowerRating => &mut self.battery.power_rating,
            ScalarParameter::ChargingEff => &mut self.battery.charging_eff,
            ScalarParameter::DischargingEff => &mut self.battery.discharging_eff,
            ScalarParameter::InitialSoc => &mut self.battery.initial_soc,
            ScalarParameter::ChMaxThreshold => &mut self.thresholds.ch_max_threshold,
            ScalarParameter::DischMinThreshold => &mut self.thresholds.disch_min_threshold,
        };
        *slot = value;
    }

    /// Sets a scalar by its external key, e.g. `"power_rating"`.
    pub fn set_named(&mut self, name: &str, value: f64) -> Result<(), ModelError> {
        let param = name.parse::<ScalarParameter>()?;
        self.set_scalar(param, value);
        Ok(())
    }

    pub fn named(&self, name: &str) -> Result<f64, ModelError> {
        Ok(self.scalar(name.parse()?))
    }

    pub fn set_charge_price(&mut self, period: usize, price: f64) -> Result<(), ModelError> {
        self.horizon.position(period)?;
        self.charge_price.insert(period, price);
        Ok(())
    }

    pub fn set_discharge_price(&mut self, period: usize, price: f64) -> Result<(), ModelError> {
        self.horizon.position(period)?;
        self.discharge_price.insert(period, price);
        Ok(())
    }

    /// Sets the same market price for charging and discharging in `period`.
    pub fn set_price(&mut self, period: usize, price: f64) -> Result<(), ModelError> {
        self.set_charge_price(period, price)?;
        self.set_discharge_price(period, price)
    }

    pub fn charge_price(&self, period: usize) -> Result<f64, ModelError> {
        self.price(PriceSeries::Charge, period)
    }

    pub fn discharge_price(&self, period: usize) -> Result<f64, ModelError> {
        self.price(PriceSeries::Discharge, period)
    }

    fn price(&self, series: PriceSeries, period: usize) -> Result<f64, ModelError> {
        self.horizon.position(period)?;
        let prices = match series {
            PriceSeries::Charge => &self.charge_price,
            PriceSeries::Discharge => &self.discharge_price,
        };
        prices
            .get(&period)
            .copied()
            .ok_or(ModelError::MissingPrice { series, period })
    }

    /// Largest absolute price across both series, ignoring unset entries.
    pub fn max_abs_price(&self) -> f64 {
        self.charge_price
            .values()
            .chain(self.discharge_price.values())
            .fold(0.0_f64, |acc, price| acc.max(price.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_horizon_is_rejected() {
        assert!(matches!(Horizon::new(0), Err(ModelError::EmptyHorizon)));
        assert!(!Horizon::new(1).unwrap().is_empty());
        assert!(!Horizon::default().is_empty());
    }

    #[test]
    fn test_horizon_is_one_based() {
        let horizon = Horizon::new(3).unwrap();
        assert_eq!(horizon.periods().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(horizon.position(1).unwrap(), 0);
        assert!(matches!(
            horizon.position(0),
            Err(ModelError::UnknownPeriod { period: 0, horizon: 3 })
        ));
        assert!(horizon.position(4).is_err());
    }

    #[test]
    fn test_default_parameter_set() {
        let params = ParameterSet::default();
        assert_eq!(params.horizon().len(), 24);
        assert_eq!(params.named("storage_capacity").unwrap(), 20.0);
        assert_eq!(params.named("power_rating").unwrap(), 10.0);
        assert_eq!(params.named("charging_eff").unwrap(), 0.9);
        assert_eq!(params.named("discharging_eff").unwrap(), 0.9);
        assert_eq!(params.named("initial_soc").unwrap(), 5.0);
        assert_eq!(params.named("ch_max_threshold").unwrap(), 3.0);
        assert_eq!(params.named("disch_min_threshold").unwrap(), 2.0);

        for t in params.horizon().periods() {
            let price = params.charge_price(t).unwrap();
            assert_eq!(price, params.discharge_price(t).unwrap());
            assert_eq!(price, price.trunc());
            assert!((-5.0..15.0).contains(&price));
        }
    }

    #[test]
    fn test_random_prices_are_reproducible() {
        let mut a = ParameterSet::new(Horizon::new(10).unwrap());
        let mut b = ParameterSet::new(Horizon::new(10).unwrap());
        a.fill_random_prices(7);
        b.fill_random_prices(7);
        for t in 1..=10 {
            assert_eq!(a.charge_price(t).unwrap(), b.charge_price(t).unwrap());
        }
    }

    #[test]
    fn test_set_named_overwrites_in_place() {
        let mut params = ParameterSet::default();
        params.set_named("power_rating", 2.5).unwrap();
        params.set_named(" disch_min_threshold ", 8.0).unwrap();
        assert_eq!(params.battery.power_rating, 2.5);
        assert_eq!(params.thresholds.disch_min_threshold, 8.0);
    }

    #[test]
    fn test_unknown_parameter_name() {
        let mut params = ParameterSet::default();
        let err = params.set_named("max_cycles", 1.0).unwrap_err();
        assert!(matches!(err, ModelError::UnknownParameter(name) if name == "max_cycles"));
    }

    #[test]
    fn test_price_outside_horizon_is_rejected() {
        let mut params = ParameterSet::new(Horizon::new(2).unwrap());
        assert!(matches!(
            params.set_price(3, 1.0),
            Err(ModelError::UnknownPeriod { period: 3, horizon: 2 })
        ));
        assert!(params.charge_price(0).is_err());
    }

    #[test]
    fn test_reading_unset_price_fails() {
        let mut params = ParameterSet::new(Horizon::new(2).unwrap());
        params.set_charge_price(1, -3.0).unwrap();
        assert_eq!(params.charge_price(1).unwrap(), -3.0);
        assert!(matches!(
            params.discharge_price(1),
            Err(ModelError::MissingPrice {
                series: PriceSeries::Discharge,
                period: 1
            })
        ));
    }

    #[test]
    fn test_max_abs_price() {
        let mut params = ParameterSet::new(Horizon::new(3).unwrap());
        params.set_price(1, 4.0).unwrap();
        params.set_charge_price(2, -12.5).unwrap();
        assert_eq!(params.max_abs_price(), 12.5);
    }
}
