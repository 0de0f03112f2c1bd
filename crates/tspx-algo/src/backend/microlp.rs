//! Pure-Rust backend built on `good_lp`'s microlp solver.
//!
//! microlp runs single-threaded branch-and-bound without heuristics or cut
//! generation, so the `heuristics`/`cuts` switches are already off. The
//! wall-clock limit is passed through; a run cut short keeps its incumbent
//! when it found one.

use std::time::Instant;

use good_lp::solvers::microlp::microlp;
use good_lp::{Solution, SolverModel, WithTimeLimit};
use tracing::debug;

use super::{
    error_outcome, solution_outcome, translate, write_run_log, MilpBackend, SolveOutcome,
    SolverParams, Translated,
};
use crate::error::FormulationResult;
use crate::model::MilpModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MilpBackend for MicroLpBackend {
    fn id(&self) -> &'static str {
        "microlp"
    }

    fn optimize(
        &self,
        model: &MilpModel,
        params: &SolverParams,
    ) -> FormulationResult<SolveOutcome> {
        debug!(
            model = model.name(),
            vars = model.var_count(),
            rows = model.constraint_count(),
            time_limit = params.time_limit,
            "microlp solve"
        );

        let Translated {
            vars,
            handles,
            objective,
            constraints,
        } = translate(model);

        let start = Instant::now();
        let mut problem = vars
            .minimise(objective)
            .using(microlp)
            .with_time_limit(params.time_limit);
        for row in constraints {
            problem = problem.with(row);
        }
        let result = problem.solve();
        let runtime = start.elapsed().as_secs_f64();

        let outcome = match result {
            Ok(solution) => {
                let values = Translated::values(&handles, &solution);
                solution_outcome(model, solution.status(), values, runtime)
            }
            Err(err) => error_outcome(self.id(), err, runtime)?,
        };

        write_run_log(params, self.id(), model, &outcome)?;
        Ok(outcome)
    }
}
