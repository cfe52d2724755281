use std::fmt;

use good_lp::ResolutionError;
use thiserror::Error;

/// Which of the two indexed price parameters a lookup refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSeries {
    Charge,
    Discharge,
}

impl fmt::Display for PriceSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSeries::Charge => write!(f, "charge_price"),
            PriceSeries::Discharge => write!(f, "discharge_price"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("time horizon must contain at least one period")]
    EmptyHorizon,

    #[error("period {period} is outside the horizon 1..={horizon}")]
    UnknownPeriod { period: usize, horizon: usize },

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("{series}[{period}] read before it was set")]
    MissingPrice { series: PriceSeries, period: usize },

    #[error("unknown solver backend '{0}'")]
    UnknownBackend(String),

    #[error("problem is infeasible")]
    Infeasible,

    #[error("problem is unbounded")]
    Unbounded,

    #[error("solver error: {0}")]
    Solver(String),
}

impl From<ResolutionError> for ModelError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => ModelError::Infeasible,
            ResolutionError::Unbounded => ModelError::Unbounded,
            other => ModelError::Solver(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_errors_keep_their_kind() {
        assert!(matches!(
            ModelError::from(ResolutionError::Infeasible),
            ModelError::Infeasible
        ));
        assert!(matches!(
            ModelError::from(ResolutionError::Unbounded),
            ModelError::Unbounded
        ));
        assert!(matches!(
            ModelError::from(ResolutionError::Str("numerical trouble".to_string())),
            ModelError::Solver(msg) if msg.contains("numerical trouble")
        ));
    }

    #[test]
    fn test_missing_price_message_names_the_entry() {
        let err = ModelError::MissingPrice {
            series: PriceSeries::Discharge,
            period: 7,
        };
        assert_eq!(err.to_string(), "discharge_price[7] read before it was set");
    }
}
