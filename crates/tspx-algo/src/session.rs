//! Solver sessions.
//!
//! A session binds one backend to one set of run parameters (identity, time
//! limit, single thread, heuristics and cuts off). The parameters are fixed
//! when the session opens, so every solve through it runs under the same
//! settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{MilpBackend, SolveOutcome, SolverParams};
use crate::error::{FormulationError, FormulationResult};
use crate::model::MilpModel;

/// Settings used to open a [`SolverSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Who runs the experiment; recorded in the solver log
    pub identity: String,
    /// Seconds per solve
    pub time_limit: f64,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default)]
    pub heuristics: bool,
    #[serde(default)]
    pub cuts: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_threads() -> u32 {
    1
}

impl SessionConfig {
    pub fn new(identity: impl Into<String>, time_limit: f64) -> Self {
        Self {
            identity: identity.into(),
            time_limit,
            threads: 1,
            heuristics: false,
            cuts: false,
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    fn params(&self) -> SolverParams {
        SolverParams {
            time_limit: self.time_limit,
            threads: self.threads,
            heuristics: self.heuristics,
            cuts: self.cuts,
            log_file: self.log_file.clone(),
        }
    }
}

/// An open connection to a MILP backend.
pub struct SolverSession {
    backend: Box<dyn MilpBackend>,
    config: SessionConfig,
    params: SolverParams,
}

impl std::fmt::Debug for SolverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverSession")
            .field("backend", &self.backend.id())
            .field("config", &self.config)
            .field("params", &self.params)
            .finish()
    }
}

impl SolverSession {
    /// Open a session, rejecting unusable backends and settings.
    pub fn open(backend: Box<dyn MilpBackend>, config: SessionConfig) -> FormulationResult<Self> {
        if !backend.is_available() {
            return Err(FormulationError::Session(format!(
                "backend '{}' is not available",
                backend.id()
            )));
        }
        if config.identity.trim().is_empty() {
            return Err(FormulationError::Session(
                "session identity must not be blank".into(),
            ));
        }
        if !config.time_limit.is_finite() || config.time_limit <= 0.0 {
            return Err(FormulationError::Session(format!(
                "time limit must be a positive number of seconds, got {}",
                config.time_limit
            )));
        }
        if config.threads == 0 {
            return Err(FormulationError::Session("thread count must be at least 1".into()));
        }
        debug!(backend = backend.id(), identity = %config.identity, "solver session opened");

        let params = config.params();
        Ok(Self {
            backend,
            config,
            params,
        })
    }

    pub fn backend_id(&self) -> &'static str {
        self.backend.id()
    }

    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Parameters applied to every solve.
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn optimize(&self, model: &MilpModel) -> FormulationResult<SolveOutcome> {
        self.backend.optimize(model, &self.params)
    }
}
