use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use battery_model::PeriodDispatch;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, Solver, SolverModel,
};

use crate::error::ModelError;
use crate::milp::constraints::{BIG_M, ConstraintFamily, RuleConstraint, build_constraints};
use crate::milp::dispatch::Dispatch;
use crate::milp::objective::revenue_objective;
use crate::milp::parameters::ParameterSet;
use crate::milp::variables::DecisionVariables;

/// MILP backends reachable through good_lp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverBackend {
    /// Pure-Rust branch and bound, always available
    #[default]
    Microlp,
    #[cfg(feature = "highs")]
    Highs,
    #[cfg(feature = "scip")]
    Scip,
}

impl SolverBackend {
    pub fn name(&self) -> &'static str {
        match self {
            SolverBackend::Microlp => "microlp",
            #[cfg(feature = "highs")]
            SolverBackend::Highs => "highs",
            #[cfg(feature = "scip")]
            SolverBackend::Scip => "scip",
        }
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverBackend {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "microlp" => Ok(SolverBackend::Microlp),
            #[cfg(feature = "highs")]
            "highs" => Ok(SolverBackend::Highs),
            #[cfg(feature = "scip")]
            "scip" => Ok(SolverBackend::Scip),
            _ => Err(ModelError::UnknownBackend(s.to_string())),
        }
    }
}

/// A complete, solver-ready description of one scheduling problem.
///
/// Built in a fixed order: parameters, then variables (bounds read here), then
/// constraint rules, then the objective. The formulation borrows its
/// parameter set, so the parameters cannot change underneath the baked-in
/// bounds while it is alive.
pub struct Formulation<'a> {
    params: &'a ParameterSet,
    problem: ProblemVariables,
    variables: DecisionVariables,
    constraints: Vec<RuleConstraint>,
    objective: Expression,
}

impl<'a> Formulation<'a> {
    pub fn new(params: &'a ParameterSet) -> Result<Self, ModelError> {
        if params.thresholds.windows_overlap() {
            tracing::warn!(
                ch_max_threshold = params.thresholds.ch_max_threshold,
                disch_min_threshold = params.thresholds.disch_min_threshold,
                "discharge threshold is below charge threshold, price windows overlap"
            );
        }
        tracing::debug!(
            max_abs_price = params.max_abs_price(),
            big_m = BIG_M,
            "formulating arbitrage model"
        );

        let mut problem = ProblemVariables::new();
        let variables = DecisionVariables::declare(params, &mut problem);
        let constraints = build_constraints(params, &variables)?;
        let objective = revenue_objective(params, &variables)?;

        Ok(Self {
            params,
            problem,
            variables,
            constraints,
            objective,
        })
    }

    pub fn params(&self) -> &ParameterSet {
        self.params
    }

    pub fn variables(&self) -> &DecisionVariables {
        &self.variables
    }

    pub fn constraints(&self) -> &[RuleConstraint] {
        &self.constraints
    }

    pub fn constraint_count(&self, family: ConstraintFamily) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.family == family)
            .count()
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn solve(self, backend: SolverBackend) -> Result<Dispatch, ModelError> {
        match backend {
            SolverBackend::Microlp => self.solve_with(good_lp::microlp),
            #[cfg(feature = "highs")]
            SolverBackend::Highs => self.solve_with(good_lp::highs),
            #[cfg(feature = "scip")]
            SolverBackend::Scip => self.solve_with(good_lp::scip),
        }
    }

    /// Hands the problem to `solver` and reads back every period's decisions.
    ///
    /// Solver failures are passed through unchanged: no retry, no diagnosis.
    pub fn solve_with<S>(self, solver: S) -> Result<Dispatch, ModelError>
    where
        S: Solver,
        S::Model: SolverModel<Error = ResolutionError>,
    {
        let Formulation {
            params,
            problem,
            variables,
            constraints,
            objective,
        } = self;

        let mut model = problem.maximise(objective.clone()).using(solver);
        for rule in constraints {
            model = model.with(rule.constraint);
        }

        let start_time = Instant::now();
        let opt_result = model.solve();
        let optimization_duration = start_time.elapsed();

        let solution = match opt_result {
            Ok(solution) => solution,
            Err(e) => {
                tracing::info!(
                    duration_ms = optimization_duration.as_millis() as u64,
                    "solve failed: {}",
                    e
                );
                return Err(e.into());
            }
        };

        let mut periods = Vec::with_capacity(variables.horizon().len());
        for (t, v) in variables.iter() {
            periods.push(PeriodDispatch {
                period: t,
                charge_price: params.charge_price(t)?,
                discharge_price: params.discharge_price(t)?,
                charge_energy: solution.value(v.charge_energy),
                discharge_energy: solution.value(v.discharge_energy),
                ch_allowed: solution.value(v.ch_allowed) > 0.5,
                ch_state: solution.value(v.ch_state) > 0.5,
                disch_allowed: solution.value(v.disch_allowed) > 0.5,
                disch_state: solution.value(v.disch_state) > 0.5,
                soc: solution.value(v.soc),
            });
        }
        let objective_value = solution.eval(objective);

        tracing::info!(
            objective = objective_value,
            duration_ms = optimization_duration.as_millis() as u64,
            "solved arbitrage model"
        );

        Ok(Dispatch {
            periods,
            objective: objective_value,
            optimization_duration_ms: optimization_duration.as_millis(),
        })
    }
}

/// Owned parameter set that can be formulated and solved any number of times.
#[derive(Debug, Clone, Default)]
pub struct ArbitrageModel {
    params: ParameterSet,
}

impl ArbitrageModel {
    pub fn new(params: ParameterSet) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Mutable access for overriding inputs between solves.
    pub fn params_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    pub fn formulate(&self) -> Result<Formulation<'_>, ModelError> {
        Formulation::new(&self.params)
    }

    /// Builds a fresh formulation from the current parameters and solves it.
    pub fn solve(&self, backend: SolverBackend) -> Result<Dispatch, ModelError> {
        self.formulate()?.solve(backend)
    }
}

/// Formulates and solves `params` in one call.
pub fn run_arbitrage_opt(
    params: &ParameterSet,
    backend: SolverBackend,
) -> Result<Dispatch, ModelError> {
    Formulation::new(params)?.solve(backend)
}
