use serde::{Deserialize, Serialize};

/// Physical limits of a single grid-connected battery.
///
/// All energies are in MWh and powers in MW over one period of the horizon.
/// Values are taken as given; nothing here checks that they are physically sensible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryParams {
    /// Max energy storage (MWh)
    pub storage_capacity: f64,
    /// Max charge/discharge rate (MW)
    pub power_rating: f64,
    /// Charging efficiency, expected in (0, 1]
    pub charging_eff: f64,
    /// Discharging efficiency, expected in (0, 1]
    pub discharging_eff: f64,
    /// State of charge before the first period (MWh)
    pub initial_soc: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            storage_capacity: 20.0,
            power_rating: 10.0,
            charging_eff: 0.9,
            discharging_eff: 0.9,
            initial_soc: 5.0,
        }
    }
}

impl BatteryParams {
    /// Upper bound on energy drawn for charging in one period.
    pub fn max_charge_energy(&self) -> f64 {
        self.power_rating / self.charging_eff
    }

    /// Upper bound on energy delivered by discharging in one period.
    pub fn max_discharge_energy(&self) -> f64 {
        self.power_rating * self.discharging_eff
    }
}
