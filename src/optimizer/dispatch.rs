//! Optimizer facade: build the model, solve it once, extract the schedule.
//!
//! Each call owns its own program, so independent horizons can be optimised
//! concurrently without coordination. Nothing is retried: the program is
//! deterministic and a second attempt would produce the same outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::extract::extract;
use super::model::LinearProgram;
use super::solver::{GoodLpSolver, LpSolution, LpSolver, SolverError};
use super::DispatchError;
use crate::domain::{BatteryParameters, DispatchSchedule, PriceSeries};

/// Default bound on a single solve.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct DispatchOptimizer {
    solver: Arc<dyn LpSolver>,
    time_limit: Duration,
}

impl Default for DispatchOptimizer {
    fn default() -> Self {
        Self {
            solver: Arc::new(GoodLpSolver::new()),
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

impl DispatchOptimizer {
    pub fn new(solver: Arc<dyn LpSolver>, time_limit: Duration) -> Self {
        Self { solver, time_limit }
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Build, solve and extract on the calling thread, without a time limit.
    pub fn optimize_blocking(
        &self,
        prices: &PriceSeries,
        battery: &BatteryParameters,
    ) -> Result<DispatchSchedule, DispatchError> {
        let program = LinearProgram::build(prices, battery)?;
        let started = Instant::now();
        let solution = self.solver.solve(&program);
        finish(&program, solution, self.solver.name(), started.elapsed())
    }

    /// Build on the caller's task, then solve on the blocking pool under the
    /// configured time limit.
    ///
    /// A solve that overruns is reported as `SolverTimeout`; the blocking
    /// thread is left to finish on its own since the solver cannot be
    /// interrupted.
    pub async fn optimize(
        &self,
        prices: &PriceSeries,
        battery: &BatteryParameters,
    ) -> Result<DispatchSchedule, DispatchError> {
        let program = Arc::new(LinearProgram::build(prices, battery)?);
        let solver = Arc::clone(&self.solver);
        let task_program = Arc::clone(&program);
        let started = Instant::now();

        let task = tokio::task::spawn_blocking(move || solver.solve(&task_program));
        let solution = match tokio::time::timeout(self.time_limit, task).await {
            Ok(Ok(solution)) => solution,
            Ok(Err(join_error)) => {
                return Err(DispatchError::SolverUnavailable(format!(
                    "solver task failed: {join_error}"
                )));
            }
            Err(_) => {
                warn!(
                    hours = prices.len(),
                    time_limit_s = self.time_limit.as_secs_f64(),
                    "solver timed out"
                );
                return Err(DispatchError::SolverTimeout(self.time_limit));
            }
        };

        finish(&program, solution, self.solver.name(), started.elapsed())
    }
}

fn finish(
    program: &LinearProgram,
    solution: Result<LpSolution, SolverError>,
    solver_name: &str,
    elapsed: Duration,
) -> Result<DispatchSchedule, DispatchError> {
    let parameters = *program.battery();
    let solution = solution.map_err(|err| match err {
        SolverError::Infeasible => DispatchError::Infeasible { parameters },
        SolverError::Unbounded => DispatchError::Unbounded { parameters },
        SolverError::Unavailable(reason) => DispatchError::SolverUnavailable(reason),
    })?;

    let schedule = extract(program, &solution)
        .map_err(|err| DispatchError::SolverUnavailable(err.to_string()))?;

    info!(
        solver = solver_name,
        first_hour = program.prices().first_hour(),
        hours = schedule.len(),
        profit = schedule.profit,
        charged_mwh = schedule.total_charged(),
        discharged_mwh = schedule.total_discharged(),
        elapsed_ms = elapsed.as_millis() as u64,
        "dispatch optimised"
    );

    Ok(schedule)
}

/// One-shot optimization with the default solver and no time limit.
pub fn optimize_battery(
    prices: &PriceSeries,
    battery: &BatteryParameters,
) -> Result<DispatchSchedule, DispatchError> {
    DispatchOptimizer::default().optimize_blocking(prices, battery)
}

/// Drive `future` on a fresh multi-thread runtime and shut it down without
/// joining blocking solves that were abandoned after a timeout.
///
/// Dropping a runtime waits for every `spawn_blocking` task, which would let
/// an overrunning solve hold the process open past its time limit.
pub fn block_on_detached<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}
