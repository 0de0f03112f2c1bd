//! Error types for model construction and solving.
//!
//! Solve outcomes such as a reached time limit or an infeasible model are
//! *values* ([`tspx_core::SolveStatus`]), not errors. Everything here is either
//! a rejected input, a construction bug, or a backend/I-O failure.

use thiserror::Error;

use crate::model::VarId;

/// Structural problems in a [`MilpModel`](crate::model::MilpModel).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("variable {0:?} is not declared in this model")]
    UnknownVariable(VarId),

    #[error("variable '{name}' has inverted bounds [{lower}, {upper}]")]
    InvertedBounds { name: String, lower: f64, upper: f64 },

    #[error("non-finite {what} in constraint '{constraint}'")]
    NonFinite { constraint: String, what: &'static str },
}

/// Errors raised while building or solving a formulation.
#[derive(Error, Debug)]
pub enum FormulationError {
    /// The solver session could not be opened or configured
    #[error("Solver session error: {0}")]
    Session(String),

    /// The instance cannot be modeled as a tour
    #[error("Model build error: {0}")]
    ModelBuild(String),

    /// An auxiliary family broke an internal invariant while being built
    #[error("{formulation} elimination construction failed: {message}")]
    EliminationConstruction {
        formulation: &'static str,
        message: String,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The backend failed for a reason other than a solve status
    #[error("Solver error: {0}")]
    Solver(String),

    /// A result record could not be encoded as a log line
    #[error("Result record error: {0}")]
    Record(#[source] tspx_core::TspError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormulationError {
    pub fn elimination(formulation: &'static str, message: impl Into<String>) -> Self {
        FormulationError::EliminationConstruction {
            formulation,
            message: message.into(),
        }
    }
}

impl From<tspx_core::TspError> for FormulationError {
    fn from(err: tspx_core::TspError) -> Self {
        FormulationError::ModelBuild(err.to_string())
    }
}

pub type FormulationResult<T> = Result<T, FormulationError>;
