use serde::{Deserialize, Serialize};

/// Solved decisions for one period of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDispatch {
    /// Period index, starting at 1
    pub period: usize,
    pub charge_price: f64,
    pub discharge_price: f64,
    /// Energy drawn for charging (MWh)
    pub charge_energy: f64,
    /// Energy delivered by discharging (MWh)
    pub discharge_energy: f64,
    pub ch_allowed: bool,
    pub ch_state: bool,
    pub disch_allowed: bool,
    pub disch_state: bool,
    /// State of charge at the end of the period (MWh)
    pub soc: f64,
}

impl PeriodDispatch {
    /// Change in stored energy over the period, counting only active flows.
    pub fn net_energy(&self) -> f64 {
        let charged = if self.ch_state { self.charge_energy } else { 0.0 };
        let discharged = if self.disch_state {
            self.discharge_energy
        } else {
            0.0
        };
        charged - discharged
    }

    /// Market revenue of the period: sales minus purchases.
    pub fn revenue(&self) -> f64 {
        let sales = if self.disch_state {
            self.discharge_price * self.discharge_energy
        } else {
            0.0
        };
        let purchases = if self.ch_state {
            self.charge_price * self.charge_energy
        } else {
            0.0
        };
        sales - purchases
    }

    pub fn is_idle(&self) -> bool {
        !self.ch_state && !self.disch_state
    }
}
