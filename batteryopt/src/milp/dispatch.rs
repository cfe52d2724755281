use std::fmt;

use battery_model::PeriodDispatch;

use crate::milp::constraints::EPSILON;
use crate::milp::parameters::ParameterSet;

/// Absolute slack allowed when checking solver output
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Solved schedule over the whole horizon
#[derive(Debug, Clone, Default)]
pub struct Dispatch {
    pub periods: Vec<PeriodDispatch>,
    /// Objective value reported for the solution
    pub objective: f64,
    pub optimization_duration_ms: u128,
}

/// A feasibility rule broken by a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    ChargeWithoutPermission { period: usize },
    DischargeWithoutPermission { period: usize },
    SimultaneousActivity { period: usize },
    ChargeWhileInactive { period: usize, energy: f64 },
    DischargeWhileInactive { period: usize, energy: f64 },
    ChargeOutOfRange { period: usize, energy: f64 },
    DischargeOutOfRange { period: usize, energy: f64 },
    SocOutOfBounds { period: usize, soc: f64 },
    SocRecursion { period: usize, expected: f64, actual: f64 },
    MissingPeriod { period: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::ChargeWithoutPermission { period } => {
                write!(f, "period {period}: charging without permission")
            }
            InvariantViolation::DischargeWithoutPermission { period } => {
                write!(f, "period {period}: discharging without permission")
            }
            InvariantViolation::SimultaneousActivity { period } => {
                write!(f, "period {period}: charging and discharging at once")
            }
            InvariantViolation::ChargeWhileInactive { period, energy } => {
                write!(f, "period {period}: {energy} MWh charged while inactive")
            }
            InvariantViolation::DischargeWhileInactive { period, energy } => {
                write!(f, "period {period}: {energy} MWh discharged while inactive")
            }
            InvariantViolation::ChargeOutOfRange { period, energy } => {
                write!(f, "period {period}: charge energy {energy} outside its bounds")
            }
            InvariantViolation::DischargeOutOfRange { period, energy } => {
                write!(f, "period {period}: discharge energy {energy} outside its bounds")
            }
            InvariantViolation::SocOutOfBounds { period, soc } => {
                write!(f, "period {period}: soc {soc} outside [0, capacity]")
            }
            InvariantViolation::SocRecursion {
                period,
                expected,
                actual,
            } => write!(f, "period {period}: soc {actual} but recursion gives {expected}"),
            InvariantViolation::MissingPeriod { period } => {
                write!(f, "period {period}: no dispatch entry")
            }
        }
    }
}

impl Dispatch {
    pub fn period(&self, period: usize) -> Option<&PeriodDispatch> {
        self.periods.iter().find(|p| p.period == period)
    }

    pub fn total_charged(&self) -> f64 {
        self.periods
            .iter()
            .filter(|p| p.ch_state)
            .map(|p| p.charge_energy)
            .sum()
    }

    pub fn total_discharged(&self) -> f64 {
        self.periods
            .iter()
            .filter(|p| p.disch_state)
            .map(|p| p.discharge_energy)
            .sum()
    }

    /// Revenue recomputed from the dispatched values, in the gross
    /// `price * state * energy` form.
    pub fn revenue(&self) -> f64 {
        self.periods.iter().map(PeriodDispatch::revenue).sum()
    }

    pub fn final_soc(&self) -> Option<f64> {
        self.periods.last().map(|p| p.soc)
    }

    /// Checks the dispatch against the feasibility rules of the model and
    /// returns every violation found, in period order.
    pub fn verify(&self, params: &ParameterSet) -> Vec<InvariantViolation> {
        let tol = FEASIBILITY_TOLERANCE;
        let battery = &params.battery;
        let max_charge = battery.max_charge_energy();
        let max_discharge = battery.max_discharge_energy();

        let mut violations = Vec::new();
        let mut previous_soc = battery.initial_soc;

        for t in params.horizon().periods() {
            let Some(p) = self.period(t) else {
                violations.push(InvariantViolation::MissingPeriod { period: t });
                continue;
            };

            if p.ch_state && !p.ch_allowed {
                violations.push(InvariantViolation::ChargeWithoutPermission { period: t });
            }
            if p.disch_state && !p.disch_allowed {
                violations.push(InvariantViolation::DischargeWithoutPermission { period: t });
            }
            if p.ch_state && p.disch_state {
                violations.push(InvariantViolation::SimultaneousActivity { period: t });
            }

            if p.ch_state {
                if p.charge_energy < EPSILON - tol || p.charge_energy > max_charge + tol {
                    violations.push(InvariantViolation::ChargeOutOfRange {
                        period: t,
                        energy: p.charge_energy,
                    });
                }
            } else if p.charge_energy.abs() > tol {
                violations.push(InvariantViolation::ChargeWhileInactive {
                    period: t,
                    energy: p.charge_energy,
                });
            }

            if p.disch_state {
                if p.discharge_energy < EPSILON - tol || p.discharge_energy > max_discharge + tol {
                    violations.push(InvariantViolation::DischargeOutOfRange {
                        period: t,
                        energy: p.discharge_energy,
                    });
                }
            } else if p.discharge_energy.abs() > tol {
                violations.push(InvariantViolation::DischargeWhileInactive {
                    period: t,
                    energy: p.discharge_energy,
                });
            }

            if p.soc < -tol || p.soc > battery.storage_capacity + tol {
                violations.push(InvariantViolation::SocOutOfBounds {
                    period: t,
                    soc: p.soc,
                });
            }

            let expected = previous_soc + p.net_energy();
            if (p.soc - expected).abs() > tol {
                violations.push(InvariantViolation::SocRecursion {
                    period: t,
                    expected,
                    actual: p.soc,
                });
            }
            previous_soc = p.soc;
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::parameters::Horizon;

    fn params() -> ParameterSet {
        let mut params = ParameterSet::new(Horizon::new(2).unwrap());
        params.battery.storage_capacity = 10.0;
        params.battery.power_rating = 5.0;
        params.battery.charging_eff = 1.0;
        params.battery.discharging_eff = 1.0;
        params.battery.initial_soc = 0.0;
        params
    }

    fn idle(period: usize, soc: f64) -> PeriodDispatch {
        PeriodDispatch {
            period,
            charge_price: 1.0,
            discharge_price: 10.0,
            charge_energy: 0.0,
            discharge_energy: 0.0,
            ch_allowed: false,
            ch_state: false,
            disch_allowed: false,
            disch_state: false,
            soc,
        }
    }

    fn arbitrage() -> Dispatch {
        Dispatch {
            periods: vec![
                PeriodDispatch {
                    charge_energy: 5.0,
                    ch_allowed: true,
                    ch_state: true,
                    ..idle(1, 5.0)
                },
                PeriodDispatch {
                    discharge_energy: 5.0,
                    disch_allowed: true,
                    disch_state: true,
                    ..idle(2, 0.0)
                },
            ],
            objective: 45.0,
            optimization_duration_ms: 0,
        }
    }

    #[test]
    fn test_consistent_dispatch_passes() {
        let dispatch = arbitrage();
        assert!(dispatch.verify(&params()).is_empty());
        assert_eq!(dispatch.total_charged(), 5.0);
        assert_eq!(dispatch.total_discharged(), 5.0);
        assert_eq!(dispatch.revenue(), 45.0);
        assert_eq!(dispatch.final_soc(), Some(0.0));
    }

    #[test]
    fn test_soc_recursion_mismatch() {
        let mut dispatch = arbitrage();
        dispatch.periods[0].soc = 4.0;
        let violations = dispatch.verify(&params());
        assert!(violations.contains(&InvariantViolation::SocRecursion {
            period: 1,
            expected: 5.0,
            actual: 4.0,
        }));
        // period 2 is checked against the reported soc of period 1
        assert!(violations.contains(&InvariantViolation::SocRecursion {
            period: 2,
            expected: -1.0,
            actual: 0.0,
        }));
    }

    #[test]
    fn test_simultaneous_activity_is_flagged() {
        let mut dispatch = arbitrage();
        dispatch.periods[1].ch_allowed = true;
        dispatch.periods[1].ch_state = true;
        dispatch.periods[1].charge_energy = 1.0;
        dispatch.periods[1].soc = 1.0;
        let violations = dispatch.verify(&params());
        assert_eq!(
            violations,
            vec![InvariantViolation::SimultaneousActivity { period: 2 }]
        );
    }

    #[test]
    fn test_activity_needs_permission() {
        let mut dispatch = arbitrage();
        dispatch.periods[0].ch_allowed = false;
        dispatch.periods[1].disch_allowed = false;
        assert_eq!(
            dispatch.verify(&params()),
            vec![
                InvariantViolation::ChargeWithoutPermission { period: 1 },
                InvariantViolation::DischargeWithoutPermission { period: 2 },
            ]
        );
    }

    #[test]
    fn test_energy_must_follow_state() {
        let mut dispatch = arbitrage();
        dispatch.periods[0].ch_state = false;
        let violations = dispatch.verify(&params());
        assert!(violations.contains(&InvariantViolation::ChargeWhileInactive {
            period: 1,
            energy: 5.0,
        }));
    }

    #[test]
    fn test_energy_bounds_and_capacity() {
        let mut params = params();
        params.battery.storage_capacity = 4.0;
        params.battery.power_rating = 4.0;
        let violations = arbitrage().verify(&params);
        assert!(violations.contains(&InvariantViolation::ChargeOutOfRange {
            period: 1,
            energy: 5.0,
        }));
        assert!(violations.contains(&InvariantViolation::DischargeOutOfRange {
            period: 2,
            energy: 5.0,
        }));
        assert!(violations.contains(&InvariantViolation::SocOutOfBounds {
            period: 1,
            soc: 5.0,
        }));
    }

    #[test]
    fn test_active_flow_below_epsilon() {
        let mut dispatch = arbitrage();
        dispatch.periods[0].charge_energy = EPSILON / 10.0;
        dispatch.periods[0].soc = EPSILON / 10.0;
        dispatch.periods[1].discharge_energy = EPSILON / 10.0;
        let violations = dispatch.verify(&params());
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, InvariantViolation::ChargeOutOfRange { period: 1, .. }))
        );
    }

    #[test]
    fn test_missing_period() {
        let mut dispatch = arbitrage();
        dispatch.periods.pop();
        assert_eq!(
            dispatch.verify(&params()),
            vec![InvariantViolation::MissingPeriod { period: 2 }]
        );
    }
}
