//! External LP solver seam.
//!
//! The dispatch model only needs "maximise this linear objective subject to
//! these rows"; `GoodLpSolver` answers that with good_lp's pure Rust
//! backends, and tests substitute their own implementations.

use std::panic::{catch_unwind, AssertUnwindSafe};

use good_lp::{
    clarabel, constraint, minilp, variable, Expression, ProblemVariables, ResolutionError,
    Solution, Solver, SolverModel,
};
use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use super::constraints::{LinearExpr, Relation};
use super::model::LinearProgram;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("problem is infeasible")]
    Infeasible,
    #[error("problem is unbounded")]
    Unbounded,
    #[error("{0}")]
    Unavailable(String),
}

/// Optimal assignment returned by a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// Variable values indexed by `LinearProgram::column`.
    pub values: Vec<f64>,
    pub objective: f64,
}

#[cfg_attr(test, mockall::automock)]
pub trait LpSolver: Send + Sync {
    /// Single blocking solve attempt, maximising the program's objective.
    fn solve(&self, program: &LinearProgram) -> Result<LpSolution, SolverError>;

    fn name(&self) -> &'static str;
}

/// good_lp backend a program can be handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    /// Simplex; exact vertex solutions.
    Minilp,
    /// Interior point; slower but does not trip over singular bases.
    Clarabel,
}

/// good_lp with the minilp simplex backend, falling back to clarabel when
/// minilp breaks down numerically.
///
/// minilp can panic on a singular basis for perfectly valid programs. The
/// panic is contained here and the program is retried once on clarabel;
/// infeasible and unbounded verdicts are final and never retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }

    /// Solve on one backend only, with panics reported as `Unavailable`.
    pub fn solve_with(
        &self,
        backend: Backend,
        program: &LinearProgram,
    ) -> Result<LpSolution, SolverError> {
        let values = match backend {
            Backend::Minilp => run_backend(program, minilp, backend)?,
            Backend::Clarabel => run_backend(program, clarabel, backend)?,
        };
        let values = clamp_to_bounds(program, values);
        let objective = program.objective_value(|v| {
            program.column(v).map_or(0.0, |column| values[column])
        });
        Ok(LpSolution { values, objective })
    }
}

fn to_expression(
    expr: &LinearExpr,
    columns: &[good_lp::Variable],
    program: &LinearProgram,
) -> Result<Expression, SolverError> {
    let mut expression = Expression::default();
    for &(var, coefficient) in expr.terms() {
        let column = program
            .column(var)
            .ok_or_else(|| SolverError::Unavailable(format!("{var:?} is outside the horizon")))?;
        expression += columns[column] * coefficient;
    }
    Ok(expression)
}

fn run_backend<S>(program: &LinearProgram, backend: S, name: Backend) -> Result<Vec<f64>, SolverError>
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError>,
{
    let mut problem = ProblemVariables::new();
    let columns: Vec<good_lp::Variable> = program
        .variables()
        .iter()
        .map(|(_, bounds)| {
            let definition = variable().min(bounds.lower);
            match bounds.upper {
                Some(upper) => problem.add(definition.max(upper)),
                None => problem.add(definition),
            }
        })
        .collect();

    let objective = to_expression(program.objective(), &columns, program)?;
    let mut model = problem.maximise(objective).using(backend);

    for row in program.constraints() {
        let lhs = to_expression(&row.expr, &columns, program)?;
        model = match row.relation {
            Relation::Eq => model.with(constraint!(lhs == row.rhs)),
            Relation::Le => model.with(constraint!(lhs <= row.rhs)),
        };
    }

    debug!(
        backend = %name,
        columns = columns.len(),
        rows = program.constraints().len(),
        "submitting program"
    );

    let outcome = catch_unwind(AssertUnwindSafe(move || {
        model
            .solve()
            .map(|solution| columns.iter().map(|&c| solution.value(c)).collect::<Vec<f64>>())
    }));

    match outcome {
        Ok(Ok(values)) => Ok(values),
        Ok(Err(ResolutionError::Infeasible)) => Err(SolverError::Infeasible),
        Ok(Err(ResolutionError::Unbounded)) => Err(SolverError::Unbounded),
        Ok(Err(other)) => Err(SolverError::Unavailable(format!("{name}: {other}"))),
        Err(payload) => Err(SolverError::Unavailable(format!(
            "{name} panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// Interior point values sit a hair outside their bounds.
fn clamp_to_bounds(program: &LinearProgram, mut values: Vec<f64>) -> Vec<f64> {
    for (value, (_, bounds)) in values.iter_mut().zip(program.variables()) {
        let upper = bounds.upper.unwrap_or(f64::INFINITY);
        *value = value.clamp(bounds.lower, upper);
    }
    values
}

impl LpSolver for GoodLpSolver {
    fn solve(&self, program: &LinearProgram) -> Result<LpSolution, SolverError> {
        match self.solve_with(Backend::Minilp, program) {
            Err(SolverError::Unavailable(reason)) => {
                warn!(
                    reason = %reason,
                    hours = program.prices().len(),
                    "minilp failed, retrying on clarabel"
                );
                self.solve_with(Backend::Clarabel, program)
            }
            result => result,
        }
    }

    fn name(&self) -> &'static str {
        "good_lp/minilp+clarabel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatteryParameters, PriceSeries};
    use crate::optimizer::{Constraint, ConstraintKind, Variable};

    #[test]
    fn test_solves_two_price_levels() {
        let mut prices = vec![10.0; 4];
        prices.extend(vec![100.0; 4]);
        let prices = PriceSeries::from_prices(1, &prices).unwrap();
        let program = LinearProgram::build(&prices, &BatteryParameters::default()).unwrap();

        let solution = GoodLpSolver::new().solve(&program).unwrap();
        assert_eq!(solution.values.len(), program.variables().len());
        assert!(solution.objective > 0.0);
    }

    #[test]
    fn test_reports_infeasible_program() {
        let prices = PriceSeries::from_prices(1, &[1.0, 2.0]).unwrap();
        let program = LinearProgram::build(&prices, &BatteryParameters::default())
            .unwrap()
            .with_constraint(Constraint {
                kind: ConstraintKind::InitialState,
                hour: 1,
                expr: LinearExpr::new().with(Variable::StateOfCharge(1), 1.0),
                relation: Relation::Eq,
                rhs: 1.0,
            });

        let err = GoodLpSolver::new().solve(&program).unwrap_err();
        assert_eq!(err, SolverError::Infeasible);
    }

    #[test]
    fn test_solver_name() {
        assert_eq!(GoodLpSolver::new().name(), "good_lp/minilp+clarabel");
        assert_eq!(Backend::Clarabel.to_string(), "clarabel");
    }

    #[test]
    fn test_backends_agree_on_two_price_levels() {
        let mut prices = vec![10.0; 24];
        prices.extend(vec![100.0; 24]);
        let prices = PriceSeries::from_prices(1, &prices).unwrap();
        let program = LinearProgram::build(&prices, &BatteryParameters::default()).unwrap();

        let simplex = GoodLpSolver::new().solve_with(Backend::Minilp, &program).unwrap();
        let interior = GoodLpSolver::new().solve_with(Backend::Clarabel, &program).unwrap();
        assert!((simplex.objective - interior.objective).abs() < 1e-5 * simplex.objective.abs());

        let value = |v: Variable| program.column(v).map_or(0.0, |c| interior.values[c]);
        assert!(program.is_feasible(value, 1e-6));
    }

    #[test]
    fn test_panic_payloads_become_messages() {
        let caught = catch_unwind(|| panic!("singular basis")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "singular basis");

        let caught = catch_unwind(|| panic!("{} at {}", "singular", 3)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "singular at 3");
    }
}
