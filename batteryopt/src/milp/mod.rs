pub mod constraints;
pub mod dispatch;
pub mod formulation;
pub mod objective;
pub mod parameters;
pub mod variables;

pub use constraints::{BIG_M, ConstraintFamily, EPSILON, RuleConstraint, build_constraints};
pub use dispatch::{Dispatch, InvariantViolation};
pub use formulation::{ArbitrageModel, Formulation, SolverBackend, run_arbitrage_opt};
pub use objective::revenue_objective;
pub use parameters::{Horizon, ParameterSet, ScalarParameter};
pub use variables::{DecisionVariables, PeriodVariables};
