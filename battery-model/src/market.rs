use serde::{Deserialize, Serialize};

/// Price gates for the arbitrage schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceThresholds {
    /// Charge only if price < threshold
    pub ch_max_threshold: f64,
    /// Discharge only if price > threshold
    pub disch_min_threshold: f64,
}

impl Default for PriceThresholds {
    fn default() -> Self {
        Self {
            ch_max_threshold: 3.0,
            disch_min_threshold: 2.0,
        }
    }
}

impl PriceThresholds {
    pub fn new(ch_max_threshold: f64, disch_min_threshold: f64) -> Self {
        Self {
            ch_max_threshold,
            disch_min_threshold,
        }
    }

    /// True when some price would sit inside both the charge and the discharge window.
    ///
    /// Mutual exclusion still prevents simultaneous activity, but the gates alone
    /// no longer separate buying from selling.
    pub fn windows_overlap(&self) -> bool {
        self.disch_min_threshold < self.ch_max_threshold
    }
}
