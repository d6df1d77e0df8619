use std::time::Duration;

use thiserror::Error;

use crate::domain::BatteryParameters;

/// Errors surfaced by the dispatch optimizer.
///
/// Every variant is reported to the immediate caller; nothing in the crate
/// retries, logs-and-ignores or coerces a failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed price series (empty, non-contiguous hours, non-numeric price).
    #[error("Invalid price series: {0}")]
    InvalidInput(String),

    #[error("Invalid battery parameters: {0}")]
    InvalidParameters(String),

    /// The constraint set admits no feasible dispatch.
    #[error("Dispatch model is infeasible for {parameters}")]
    Infeasible { parameters: BatteryParameters },

    #[error("Dispatch model is unbounded for {parameters}")]
    Unbounded { parameters: BatteryParameters },

    #[error("LP solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("LP solver did not finish within {0:?}")]
    SolverTimeout(Duration),
}

impl DispatchError {
    /// Short machine-friendly name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidInput(_) => "invalid_input",
            DispatchError::InvalidParameters(_) => "invalid_parameters",
            DispatchError::Infeasible { .. } => "infeasible",
            DispatchError::Unbounded { .. } => "unbounded",
            DispatchError::SolverUnavailable(_) => "solver_unavailable",
            DispatchError::SolverTimeout(_) => "solver_timeout",
        }
    }
}

impl From<validator::ValidationErrors> for DispatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DispatchError::InvalidParameters(errors.to_string())
    }
}
