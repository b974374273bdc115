//! One build–solve–extract cycle against a solver backend.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::Result;
use crate::extract::{Plan, extract};
use crate::model::{build_model, compose_objective};
use crate::params::PlanParameters;
use crate::solver::{SolverAdapter, SolverBackend};

/// Builds the model, solves it once and extracts the plan.
///
/// The session opened from `backend` lives only for this call and is released
/// on every return path, including errors.
///
/// # Errors
///
/// Returns [`crate::error::PlanError::ModelBuild`] for invalid constants,
/// [`crate::error::PlanError::Solver`] for any non-optimal status and
/// [`crate::error::PlanError::Extraction`] if the solution cannot be read back.
pub fn run_plan<B: SolverBackend>(
    backend: &B,
    params: &PlanParameters,
    time_limit: Option<Duration>,
) -> Result<Plan> {
    params.validate()?;

    let mut session = backend.open_session()?;
    let arena = build_model(&mut session, params)?;
    compose_objective(&mut session, &arena, &params.weights);

    let started = Instant::now();
    let status = session.solve(time_limit);
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_optimal() {
        info!(%status, elapsed_ms, "solve finished");
    } else {
        warn!(%status, elapsed_ms, "solve finished without an optimal plan");
    }

    extract(status, &session, &arena, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::params::IntensityTable;
    use crate::solver::MicrolpBackend;

    #[test]
    fn invalid_constants_fail_before_solving() {
        let mut params =
            PlanParameters::with_defaults(IntensityTable::synthetic(3)).expect("defaults build");
        params.battery.efficiency = 2.0;
        let result = run_plan(&MicrolpBackend, &params, None);
        assert!(matches!(result, Err(PlanError::ModelBuild(_))));
    }
}
