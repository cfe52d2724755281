use good_lp::Expression;

use crate::error::ModelError;
use crate::milp::parameters::ParameterSet;
use crate::milp::variables::DecisionVariables;

/// Total market revenue over the horizon, to be maximised:
///
/// `sum_t discharge_price[t] * discharge_energy[t] - charge_price[t] * charge_energy[t]`
///
/// The gross form multiplies each energy by its binary state. Since an energy
/// is already forced to zero while its state is zero, the state factor is
/// dropped and the objective stays linear.
pub fn revenue_objective(
    params: &ParameterSet,
    vars: &DecisionVariables,
) -> Result<Expression, ModelError> {
    let mut objective = Expression::default();
    for (t, v) in vars.iter() {
        objective += v.discharge_energy * params.discharge_price(t)?;
        objective -= v.charge_energy * params.charge_price(t)?;
    }
    Ok(objective)
}

#[cfg(test)]
mod tests {
    use good_lp::ProblemVariables;

    use super::*;
    use crate::milp::parameters::Horizon;

    #[test]
    fn test_objective_needs_every_price() {
        let mut params = ParameterSet::new(Horizon::new(3).unwrap());
        params.set_price(1, 1.0).unwrap();
        params.set_price(2, 2.0).unwrap();
        let mut problem = ProblemVariables::new();
        let vars = DecisionVariables::declare(&params, &mut problem);

        let err = revenue_objective(&params, &vars).unwrap_err();
        assert!(matches!(err, ModelError::MissingPrice { period: 3, .. }));

        params.set_price(3, 3.0).unwrap();
        assert!(revenue_objective(&params, &vars).is_ok());
    }
}
