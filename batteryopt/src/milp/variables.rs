use good_lp::{ProblemVariables, Variable, variable};

use crate::error::ModelError;
use crate::milp::parameters::{Horizon, ParameterSet};

/// Decision variables of a single period
#[derive(Debug, Clone, Copy)]
pub struct PeriodVariables {
    pub charge_energy: Variable,
    pub ch_allowed: Variable,
    pub ch_state: Variable,
    pub discharge_energy: Variable,
    pub disch_allowed: Variable,
    pub disch_state: Variable,
    pub soc: Variable,
}

/// The seven variable families of the arbitrage model, one entry per period.
///
/// Bounds are read from the parameter set once, when the variables are
/// declared. Changing the parameters afterwards does not move them; build a
/// new formulation instead.
#[derive(Debug, Clone)]
pub struct DecisionVariables {
    horizon: Horizon,
    charge_energy: Vec<Variable>,
    ch_allowed: Vec<Variable>,
    ch_state: Vec<Variable>,
    discharge_energy: Vec<Variable>,
    disch_allowed: Vec<Variable>,
    disch_state: Vec<Variable>,
    soc: Vec<Variable>,
}

impl DecisionVariables {
    pub fn declare(params: &ParameterSet, problem: &mut ProblemVariables) -> Self {
        let horizon = params.horizon();
        let n = horizon.len();
        let max_charge_energy = params.battery.max_charge_energy();
        let max_discharge_energy = params.battery.max_discharge_energy();
        let storage_capacity = params.battery.storage_capacity;

        let mut vars = Self {
            horizon,
            charge_energy: Vec::with_capacity(n),
            ch_allowed: Vec::with_capacity(n),
            ch_state: Vec::with_capacity(n),
            discharge_energy: Vec::with_capacity(n),
            disch_allowed: Vec::with_capacity(n),
            disch_state: Vec::with_capacity(n),
            soc: Vec::with_capacity(n),
        };

        for t in horizon.periods() {
            // charging
            vars.charge_energy.push(
                problem.add(
                    variable()
                        .min(0.0)
                        .max(max_charge_energy)
                        .name(format!("charge_energy[{t}]")),
                ),
            );
            vars.ch_allowed
                .push(problem.add(variable().binary().name(format!("ch_allowed[{t}]"))));
            vars.ch_state
                .push(problem.add(variable().binary().name(format!("ch_state[{t}]"))));

            // discharging
            vars.discharge_energy.push(
                problem.add(
                    variable()
                        .min(0.0)
                        .max(max_discharge_energy)
                        .name(format!("discharge_energy[{t}]")),
                ),
            );
            vars.disch_allowed
                .push(problem.add(variable().binary().name(format!("disch_allowed[{t}]"))));
            vars.disch_state
                .push(problem.add(variable().binary().name(format!("disch_state[{t}]"))));

            vars.soc.push(
                problem.add(
                    variable()
                        .min(0.0)
                        .max(storage_capacity)
                        .name(format!("soc[{t}]")),
                ),
            );
        }

        tracing::debug!(
            periods = n,
            variables = vars.len(),
            max_charge_energy,
            max_discharge_energy,
            storage_capacity,
            "declared decision variables"
        );

        vars
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Total number of declared variables across all families.
    pub fn len(&self) -> usize {
        7 * self.soc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.soc.is_empty()
    }

    pub fn at(&self, period: usize) -> Result<PeriodVariables, ModelError> {
        let i = self.horizon.position(period)?;
        Ok(self.slot(i))
    }

    /// State of charge entering `period`: `None` for the first period, which is
    /// anchored to the initial SOC parameter instead.
    pub fn previous_soc(&self, period: usize) -> Result<Option<Variable>, ModelError> {
        let i = self.horizon.position(period)?;
        Ok(i.checked_sub(1).map(|prev| self.soc[prev]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, PeriodVariables)> + '_ {
        self.horizon.periods().map(move |t| (t, self.slot(t - 1)))
    }

    fn slot(&self, i: usize) -> PeriodVariables {
        PeriodVariables {
            charge_energy: self.charge_energy[i],
            ch_allowed: self.ch_allowed[i],
            ch_state: self.ch_state[i],
            discharge_energy: self.discharge_energy[i],
            disch_allowed: self.disch_allowed[i],
            disch_state: self.disch_state[i],
            soc: self.soc[i],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_seven_variables_per_period() {
        let params = ParameterSet::new(Horizon::new(5).unwrap());
        let mut problem = ProblemVariables::new();
        let vars = DecisionVariables::declare(&params, &mut problem);
        assert_eq!(vars.len(), 35);
        assert_eq!(vars.iter().count(), 5);
        assert_eq!(vars.horizon().len(), 5);
    }

    #[test]
    fn test_period_lookup() {
        let params = ParameterSet::new(Horizon::new(3).unwrap());
        let mut problem = ProblemVariables::new();
        let vars = DecisionVariables::declare(&params, &mut problem);

        let second = vars.at(2).unwrap();
        assert_ne!(second.charge_energy, second.discharge_energy);
        assert_eq!(vars.previous_soc(1).unwrap(), None);
        assert_eq!(vars.previous_soc(3).unwrap(), Some(second.soc));
        assert!(matches!(
            vars.at(4),
            Err(ModelError::UnknownPeriod { period: 4, horizon: 3 })
        ));
    }

    #[test]
    fn test_iter_matches_lookup() {
        let params = ParameterSet::new(Horizon::new(4).unwrap());
        let mut problem = ProblemVariables::new();
        let vars = DecisionVariables::declare(&params, &mut problem);
        for (t, period) in vars.iter() {
            assert_eq!(period.soc, vars.at(t).unwrap().soc);
            assert_eq!(period.ch_state, vars.at(t).unwrap().ch_state);
        }
    }
}
