pub mod error;
pub mod general;
pub mod milp;

// Re-export commonly used items for convenience
pub use error::ModelError;
pub use milp::{ArbitrageModel, Dispatch, ParameterSet, SolverBackend, run_arbitrage_opt};
