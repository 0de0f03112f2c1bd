//! MILP solver backends.
//!
//! A [`MilpBackend`] solves a [`MilpModel`] under a set of [`SolverParams`]
//! and reports a [`SolveOutcome`]. Backends are reached through
//! [`SolverSession`](crate::session::SolverSession); formulations never call
//! them directly.
//!
//! | backend   | feature          | integer | time limit | threads |
//! |-----------|------------------|---------|------------|---------|
//! | `microlp` | `solver-microlp` | yes     | yes        | 1       |
//! | `highs`   | `solver-highs`   | yes     | yes        | yes     |
//!
//! A solve stopped by the time limit is an outcome with status
//! `time_limit`, never an error.

#[cfg(feature = "solver-highs")]
pub mod highs;
#[cfg(feature = "solver-microlp")]
pub mod microlp;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, SolutionStatus, Variable,
};
use serde::{Deserialize, Serialize};
use tspx_core::SolveStatus;

use crate::error::{FormulationError, FormulationResult};
use crate::model::{MilpModel, Sense, VarId, VarKind};

#[cfg(feature = "solver-highs")]
pub use self::highs::HighsBackend;
#[cfg(feature = "solver-microlp")]
pub use self::microlp::MicroLpBackend;

/// Parameters a backend must honor for one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Wall-clock limit in seconds
    pub time_limit: f64,
    pub threads: u32,
    pub heuristics: bool,
    pub cuts: bool,
    /// Per-run solver log
    pub log_file: Option<PathBuf>,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            time_limit: 600.0,
            threads: 1,
            heuristics: false,
            cuts: false,
            log_file: None,
        }
    }
}

/// Result of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Objective of the incumbent, `NaN` without one
    pub objective: f64,
    /// Best proven lower bound, `NaN` when unknown
    pub bound: f64,
    /// Relative gap, `NaN` when unknown
    pub gap: f64,
    /// Seconds
    pub runtime: f64,
    /// Incumbent values indexed by [`VarId::index`]; empty without one
    pub values: Vec<f64>,
}

impl SolveOutcome {
    /// Outcome of a solve that proved its incumbent optimal.
    pub fn optimal(model: &MilpModel, values: Vec<f64>, runtime: f64) -> Self {
        let objective = model.objective().evaluate(&values);
        Self {
            status: SolveStatus::Optimal,
            objective,
            bound: objective,
            gap: 0.0,
            runtime,
            values,
        }
    }

    /// Outcome without an incumbent (infeasible, unbounded, stopped early).
    pub fn without_incumbent(status: SolveStatus, runtime: f64) -> Self {
        Self {
            status,
            objective: f64::NAN,
            bound: f64::NAN,
            gap: f64::NAN,
            runtime,
            values: Vec::new(),
        }
    }

    pub fn has_incumbent(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }
}

/// A MILP engine.
pub trait MilpBackend: Send + Sync {
    /// Unique identifier (e.g., "microlp", "highs")
    fn id(&self) -> &'static str;

    /// Check if this backend can be used at runtime
    fn is_available(&self) -> bool {
        true
    }

    /// Minimize the model's objective
    fn optimize(&self, model: &MilpModel, params: &SolverParams)
        -> FormulationResult<SolveOutcome>;
}

/// Backend selection by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[cfg(feature = "solver-microlp")]
    MicroLp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl BackendKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_BACKENDS
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            #[cfg(feature = "solver-microlp")]
            BackendKind::MicroLp => "microlp",
            #[cfg(feature = "solver-highs")]
            BackendKind::Highs => "highs",
        }
    }

    pub fn create(&self) -> Box<dyn MilpBackend> {
        match *self {
            #[cfg(feature = "solver-microlp")]
            BackendKind::MicroLp => Box::new(MicroLpBackend),
            #[cfg(feature = "solver-highs")]
            BackendKind::Highs => Box::new(HighsBackend),
        }
    }
}

const AVAILABLE_BACKENDS: &[&str] = &[
    #[cfg(feature = "solver-microlp")]
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_backend_error(label: &str) -> FormulationError {
    FormulationError::Session(format!(
        "unknown milp backend '{}'; supported values: {}",
        label,
        BackendKind::available().join(", ")
    ))
}

impl FromStr for BackendKind {
    type Err = FormulationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => {
                #[cfg(feature = "solver-microlp")]
                {
                    Ok(BackendKind::MicroLp)
                }
                #[cfg(not(feature = "solver-microlp"))]
                {
                    Err(unknown_backend_error(&normalized))
                }
            }
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(BackendKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_backend_error(&normalized))
                }
            }
            other => Err(unknown_backend_error(other)),
        }
    }
}

/// A [`MilpModel`] expressed in `good_lp` terms.
pub(crate) struct Translated {
    pub vars: ProblemVariables,
    pub handles: Vec<Variable>,
    pub objective: Expression,
    pub constraints: Vec<good_lp::Constraint>,
}

impl Translated {
    /// Read every variable back from a solution, in model order.
    pub fn values(handles: &[Variable], solution: &impl good_lp::Solution) -> Vec<f64> {
        handles.iter().map(|v| solution.value(*v)).collect()
    }
}

pub(crate) fn translate(model: &MilpModel) -> Translated {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|def| {
            let mut definition = variable().name(def.name.clone());
            if def.lower.is_finite() {
                definition = definition.min(def.lower);
            }
            if def.upper.is_finite() {
                definition = definition.max(def.upper);
            }
            let definition = match def.kind {
                VarKind::Binary => definition.binary(),
                VarKind::Integer => definition.integer(),
                VarKind::Continuous => definition,
            };
            vars.add(definition)
        })
        .collect();

    let expression = |expr: &crate::model::LinearExpr| {
        let mut out = Expression::from(expr.constant_value());
        for (var, coeff) in expr.terms() {
            out += *coeff * handles[var.index()];
        }
        out
    };

    let objective = expression(model.objective());
    let constraints = model
        .constraints()
        .iter()
        .map(|row| {
            let lhs = expression(&row.expr);
            match row.sense {
                Sense::Le => constraint!(lhs <= row.rhs),
                Sense::Eq => constraint!(lhs == row.rhs),
                Sense::Ge => constraint!(lhs >= row.rhs),
            }
        })
        .collect();

    Translated {
        vars,
        handles,
        objective,
        constraints,
    }
}

/// Outcome of a solve that returned a solution with `status`.
pub(crate) fn solution_outcome(
    model: &MilpModel,
    status: SolutionStatus,
    values: Vec<f64>,
    runtime: f64,
) -> SolveOutcome {
    match status {
        SolutionStatus::Optimal => SolveOutcome::optimal(model, values, runtime),
        SolutionStatus::TimeLimit => incumbent_outcome(model, SolveStatus::TimeLimit, values, runtime),
        SolutionStatus::GapLimit => incumbent_outcome(model, SolveStatus::Unknown, values, runtime),
    }
}

/// Stopped early: keep the incumbent only if it satisfies the model.
pub(crate) fn incumbent_outcome(
    model: &MilpModel,
    status: SolveStatus,
    values: Vec<f64>,
    runtime: f64,
) -> SolveOutcome {
    if values.iter().any(|v| !v.is_finite()) || !model.violated_constraints(&values, 1e-6).is_empty()
    {
        return SolveOutcome::without_incumbent(status, runtime);
    }
    SolveOutcome {
        status,
        objective: model.objective().evaluate(&values),
        bound: f64::NAN,
        gap: f64::NAN,
        runtime,
        values,
    }
}

/// Map a failed solve to a status; only genuine backend failures stay errors.
pub(crate) fn error_outcome(
    backend: &str,
    err: ResolutionError,
    runtime: f64,
) -> FormulationResult<SolveOutcome> {
    match err {
        ResolutionError::Infeasible => Ok(SolveOutcome::without_incumbent(
            SolveStatus::Infeasible,
            runtime,
        )),
        ResolutionError::Unbounded => Ok(SolveOutcome::without_incumbent(
            SolveStatus::Unbounded,
            runtime,
        )),
        // microlp reports a limit hit before any incumbent this way
        ResolutionError::Other(msg) if msg.starts_with("Time limit") => Ok(
            SolveOutcome::without_incumbent(SolveStatus::TimeLimit, runtime),
        ),
        other => Err(FormulationError::Solver(format!("{backend}: {other}"))),
    }
}

/// Append a short diagnostic block to the per-run solver log.
pub(crate) fn write_run_log(
    params: &SolverParams,
    backend: &str,
    model: &MilpModel,
    outcome: &SolveOutcome,
) -> FormulationResult<()> {
    let Some(path) = params.log_file.as_ref() else {
        return Ok(());
    };
    let block = format!(
        "[{backend}] model={} vars={} integral={} rows={} threads={} time_limit={}\n\
         [{backend}] status={} objective={} bound={} gap={} runtime={:.6}\n",
        model.name(),
        model.var_count(),
        model.integral_var_count(),
        model.constraint_count(),
        params.threads,
        params.time_limit,
        outcome.status,
        outcome.objective,
        outcome.bound,
        outcome.gap,
        outcome.runtime,
    );
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(block.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_is_object_safe() {
        fn _accepts_backend(_b: &dyn MilpBackend) {}
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<dyn MilpBackend>();
    }

    #[test]
    fn test_default_params() {
        let params = SolverParams::default();
        assert_eq!(params.threads, 1);
        assert!(!params.heuristics);
        assert!(!params.cuts);
    }

    #[test]
    fn test_unknown_backend_lists_supported() {
        let err = "cplex".parse::<BackendKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cplex"));
        for name in BackendKind::available() {
            assert!(msg.contains(name));
        }
    }

    fn pair_model() -> MilpModel {
        use crate::model::{Constraint, LinearExpr};
        let mut model = MilpModel::new("pair");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        model
            .add_constraint(Constraint::le(
                "one",
                LinearExpr::new().term(x, 1.0).term(y, 1.0),
                1.0,
            ))
            .unwrap();
        model
            .set_objective(LinearExpr::new().term(x, 2.0).term(y, 3.0))
            .unwrap();
        model
    }

    #[test]
    fn test_limit_without_incumbent_is_a_time_limit_outcome() {
        let err =
            ResolutionError::Other("Time limit reached before finding a feasible solution");
        let out = error_outcome("microlp", err, 0.5).unwrap();
        assert_eq!(out.status, SolveStatus::TimeLimit);
        assert!(!out.has_incumbent());
        assert_eq!(out.runtime, 0.5);
    }

    #[test]
    fn test_other_resolution_errors_stay_errors() {
        let err = ResolutionError::Str("bad option".into());
        let result = error_outcome("highs", err, 0.1);
        assert!(matches!(result, Err(FormulationError::Solver(msg)) if msg.starts_with("highs:")));
    }

    #[test]
    fn test_stopped_solution_keeps_feasible_incumbent() {
        let model = pair_model();
        let out = solution_outcome(&model, SolutionStatus::TimeLimit, vec![1.0, 0.0], 1.0);
        assert_eq!(out.status, SolveStatus::TimeLimit);
        assert_eq!(out.objective, 2.0);
        assert!(out.bound.is_nan());

        let out = solution_outcome(&model, SolutionStatus::TimeLimit, vec![1.0, 1.0], 1.0);
        assert_eq!(out.status, SolveStatus::TimeLimit);
        assert!(!out.has_incumbent());

        let out = solution_outcome(&model, SolutionStatus::Optimal, vec![0.0, 0.0], 1.0);
        assert_eq!(out.status, SolveStatus::Optimal);
    }

    #[cfg(feature = "solver-microlp")]
    #[test]
    fn test_parse_microlp() {
        let kind: BackendKind = " MicroLP ".parse().unwrap();
        assert_eq!(kind.as_str(), "microlp");
        assert_eq!(kind.create().id(), "microlp");
    }
}
