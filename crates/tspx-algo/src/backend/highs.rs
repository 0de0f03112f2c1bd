//! HiGHS backend (native, feature `solver-highs`).
//!
//! Honors the wall-clock limit, the thread count and the heuristics switch
//! (`mip_heuristic_effort = 0`). HiGHS exposes no single cut switch, so
//! `cuts = false` leaves its separators at their defaults.

use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::{Solution, SolverModel};
use tracing::debug;

use super::{
    error_outcome, solution_outcome, translate, write_run_log, MilpBackend, SolveOutcome,
    SolverParams, Translated,
};
use crate::error::FormulationResult;
use crate::model::MilpModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct HighsBackend;

impl MilpBackend for HighsBackend {
    fn id(&self) -> &'static str {
        "highs"
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
            threads = params.threads,
            "highs solve"
        );

        let Translated {
            vars,
            handles,
            objective,
            constraints,
        } = translate(model);

        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .set_option("output_flag", false)
            .set_time_limit(params.time_limit)
            .set_threads(params.threads);
        if !params.heuristics {
            problem = problem.set_option("mip_heuristic_effort", 0.0);
        }
        for row in constraints {
            problem = problem.with(row);
        }

        let start = Instant::now();
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
