//! # tspx-algo: TSP formulations and MILP plumbing
//!
//! Builds exact integer-programming models of the Traveling Salesman Problem
//! and solves them, together with their linear relaxations, through a
//! pluggable MILP backend.
//!
//! ## Architecture
//!
//! - **[`model::MilpModel`]**: solver-neutral variables, rows and objective
//! - **[`backend::MilpBackend`]**: translates a model for a concrete engine
//!   (`microlp` by default, `highs` with the `solver-highs` feature)
//! - **[`session::SolverSession`]**: one backend plus run parameters
//! - **[`formulation::SubtourElimination`]**: the five elimination strategies
//! - **[`formulation::Formulation`]**: assignment core and solve protocol
//!
//! ## Example
//!
//! ```no_run
//! use tspx_algo::backend::MicroLpBackend;
//! use tspx_algo::formulation::{Formulation, FormulationKind};
//! use tspx_algo::result_log::ResultLog;
//! use tspx_algo::session::{SessionConfig, SolverSession};
//! use tspx_core::{EdgeWeightType, Instance, Point};
//!
//! let instance = Instance::from_coordinates(
//!     "triangle",
//!     EdgeWeightType::Euc2d,
//!     vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(0.0, 4.0)],
//! )?;
//! let session = SolverSession::open(Box::new(MicroLpBackend), SessionConfig::new("lab", 60.0))?;
//! let formulation = Formulation::new(&instance, FormulationKind::Mtz.strategy(), session)?;
//! let report = formulation.solve(&ResultLog::in_dir("."))?;
//! println!("{} -> {}", report.integer.formulation, report.integer.objective);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod error;
pub mod formulation;
pub mod model;
pub mod result_log;
pub mod session;
pub mod test_utils;

pub use backend::{BackendKind, MilpBackend, SolveOutcome, SolverParams};
pub use error::{FormulationError, FormulationResult, ModelError};
pub use formulation::{
    EdgeVars, Formulation, FormulationKind, SolveReport, SubtourElimination,
};
pub use model::{Constraint, LinearExpr, MilpModel, Sense, VarId, VarKind};
pub use result_log::ResultLog;
pub use session::{SessionConfig, SolverSession};
