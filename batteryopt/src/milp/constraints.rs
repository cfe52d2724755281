//! Per-period constraint rules of the arbitrage model.
//!
//! Every rule is a pure function of the parameter set, the declared variables
//! and a period `t`, and is added once for each period of the horizon. The
//! price triggers use a Big-M encoding to tie a binary permission flag to a
//! price-versus-threshold condition; the energy bounds tie each continuous
//! energy to its binary activity flag.

use good_lp::{Constraint, Expression, constraint};

use crate::error::ModelError;
use crate::milp::parameters::ParameterSet;
use crate::milp::variables::DecisionVariables;

/// Big-M constant of the price triggers. Must dominate every price magnitude;
/// above roughly 1e5 the relaxation gets numerically loose.
pub const BIG_M: f64 = 1e6;
/// Margin by which a price must clear its threshold, and the least energy an
/// active flow may move.
pub const EPSILON: f64 = 1e-4;

pub type Rule = fn(&ParameterSet, &DecisionVariables, usize) -> Result<Constraint, ModelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintFamily {
    DischargeTrigger,
    DischargeControl,
    ChargeTrigger,
    ChargeControl,
    StateOfCharge,
    MutualExclusion,
    ChargeEnergyLower,
    ChargeEnergyUpper,
    DischargeEnergyLower,
    DischargeEnergyUpper,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 10] = [
        ConstraintFamily::DischargeTrigger,
        ConstraintFamily::DischargeControl,
        ConstraintFamily::ChargeTrigger,
        ConstraintFamily::ChargeControl,
        ConstraintFamily::StateOfCharge,
        ConstraintFamily::MutualExclusion,
        ConstraintFamily::ChargeEnergyLower,
        ConstraintFamily::ChargeEnergyUpper,
        ConstraintFamily::DischargeEnergyLower,
        ConstraintFamily::DischargeEnergyUpper,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintFamily::DischargeTrigger => "discharge_trigger",
            ConstraintFamily::DischargeControl => "discharge_control",
            ConstraintFamily::ChargeTrigger => "charge_trigger",
            ConstraintFamily::ChargeControl => "charge_control",
            ConstraintFamily::StateOfCharge => "soc_con",
            ConstraintFamily::MutualExclusion => "market_con",
            ConstraintFamily::ChargeEnergyLower => "charge_lower_energy",
            ConstraintFamily::ChargeEnergyUpper => "charge_upper_energy",
            ConstraintFamily::DischargeEnergyLower => "discharge_lower_energy",
            ConstraintFamily::DischargeEnergyUpper => "discharge_upper_energy",
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            ConstraintFamily::DischargeTrigger => disch_price_trigger_rule,
            ConstraintFamily::DischargeControl => disch_control_rule,
            ConstraintFamily::ChargeTrigger => charge_price_trigger_rule,
            ConstraintFamily::ChargeControl => charge_control_rule,
            ConstraintFamily::StateOfCharge => soc_rule,
            ConstraintFamily::MutualExclusion => mutual_exclusion_rule,
            ConstraintFamily::ChargeEnergyLower => charge_energy_lower_rule,
            ConstraintFamily::ChargeEnergyUpper => charge_energy_upper_rule,
            ConstraintFamily::DischargeEnergyLower => discharge_energy_lower_rule,
            ConstraintFamily::DischargeEnergyUpper => discharge_energy_upper_rule,
        }
    }
}

/// One instantiated rule
pub struct RuleConstraint {
    pub family: ConstraintFamily,
    pub period: usize,
    pub constraint: Constraint,
}

/// Instantiates every rule family for every period of the horizon.
pub fn build_constraints(
    params: &ParameterSet,
    vars: &DecisionVariables,
) -> Result<Vec<RuleConstraint>, ModelError> {
    let horizon = params.horizon();
    let mut constraints = Vec::with_capacity(ConstraintFamily::ALL.len() * horizon.len());

    for family in ConstraintFamily::ALL {
        let rule = family.rule();
        for t in horizon.periods() {
            constraints.push(RuleConstraint {
                family,
                period: t,
                constraint: rule(params, vars, t)?,
            });
        }
    }

    tracing::debug!(
        constraints = constraints.len(),
        families = ConstraintFamily::ALL.len(),
        "built constraint rules"
    );
    Ok(constraints)
}

/// `discharge_price[t] - disch_min_threshold >= EPSILON - BIG_M * (1 - disch_allowed[t])`
///
/// Permission to discharge requires the price to clear the threshold by at
/// least `EPSILON`; otherwise the relation is slack.
pub fn disch_price_trigger_rule(
    params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    let margin = params.discharge_price(t)? - params.thresholds.disch_min_threshold;
    let bound = permission_bound(margin - EPSILON + BIG_M);
    Ok(constraint!(v.disch_allowed <= bound))
}

/// `disch_state[t] <= disch_allowed[t]`
pub fn disch_control_rule(
    _params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    Ok(constraint!(v.disch_state <= v.disch_allowed))
}

/// `charge_price[t] - ch_max_threshold <= BIG_M * (1 - ch_allowed[t])`
pub fn charge_price_trigger_rule(
    params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    let excess = params.charge_price(t)? - params.thresholds.ch_max_threshold;
    let bound = permission_bound(BIG_M - excess);
    Ok(constraint!(v.ch_allowed <= bound))
}

/// Upper bound on a binary flag `b` implied by the row `BIG_M * b <= rhs`.
///
/// Prices are constants here, so the row is divided through by `BIG_M` and the
/// right-hand side rounded down. The feasible set of `b` in {0, 1} is
/// unchanged and the solver only sees a unit coefficient. A negative `rhs`
/// stays negative and the row stays infeasible.
pub fn permission_bound(rhs: f64) -> f64 {
    (rhs / BIG_M).floor().min(1.0)
}

/// `ch_state[t] <= ch_allowed[t]`
pub fn charge_control_rule(
    _params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    Ok(constraint!(v.ch_state <= v.ch_allowed))
}

/// `soc[t] = soc[t-1] + charge_energy[t] - discharge_energy[t]`, with
/// `initial_soc` in place of `soc[0]`.
///
/// The products `ch_state * charge_energy` and `disch_state * discharge_energy`
/// of the physical recursion are written as the bare energies: the upper
/// energy rules already pin an energy to zero whenever its state is zero.
pub fn soc_rule(
    params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    let previous: Expression = match vars.previous_soc(t)? {
        Some(soc) => soc.into(),
        None => params.battery.initial_soc.into(),
    };
    Ok(constraint!(
        v.soc == previous + v.charge_energy - v.discharge_energy
    ))
}

/// `ch_state[t] + disch_state[t] <= 1`
pub fn mutual_exclusion_rule(
    _params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    Ok(constraint!(v.ch_state + v.disch_state <= 1.0))
}

/// `charge_energy[t] >= EPSILON * ch_state[t]`
pub fn charge_energy_lower_rule(
    _params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    Ok(constraint!(v.charge_energy >= v.ch_state * EPSILON))
}

/// `charge_energy[t] <= (power_rating / charging_eff) * ch_state[t]`
pub fn charge_energy_upper_rule(
    params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    let limit = params.battery.max_charge_energy();
    Ok(constraint!(v.charge_energy <= v.ch_state * limit))
}

/// `discharge_energy[t] >= EPSILON * disch_state[t]`
pub fn discharge_energy_lower_rule(
    _params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    Ok(constraint!(v.discharge_energy >= v.disch_state * EPSILON))
}

/// `discharge_energy[t] <= (power_rating * discharging_eff) * disch_state[t]`
pub fn discharge_energy_upper_rule(
    params: &ParameterSet,
    vars: &DecisionVariables,
    t: usize,
) -> Result<Constraint, ModelError> {
    let v = vars.at(t)?;
    let limit = params.battery.max_discharge_energy();
    Ok(constraint!(v.discharge_energy <= v.disch_state * limit))
}
