//! Experiment configuration
//!
//! An optional TOML file fixes the settings of a batch of runs; command-line
//! flags override individual values.
//!
//! ```toml
//! identity = "lab-7"
//! formulations = ["mtz", "log-lex"]
//! dfj_max_nodes = 12
//!
//! [solver]
//! backend = "microlp"
//! time_limit = 120.0
//!
//! [output]
//! results_dir = "results"
//! log_dir = "logs"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tspx_algo::formulation::DFJ_WARN_NODES;
use tspx_algo::{BackendKind, FormulationKind, SessionConfig};

/// Settings for a batch of solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Recorded in every solver log
    #[serde(default = "default_identity")]
    pub identity: String,
    /// Formulation names; empty selects all five
    #[serde(default)]
    pub formulations: Vec<String>,
    /// DFJ runs are skipped above this many nodes
    #[serde(default = "default_dfj_max_nodes")]
    pub dfj_max_nodes: usize,
    #[serde(default)]
    pub solver: SolverSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSection {
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Seconds per solve
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            formulations: Vec::new(),
            dfj_max_nodes: default_dfj_max_nodes(),
            solver: SolverSection::default(),
            output: OutputSection::default(),
        }
    }
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            time_limit: default_time_limit(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_identity() -> String {
    "tspx".to_string()
}

fn default_dfj_max_nodes() -> usize {
    DFJ_WARN_NODES
}

fn default_backend() -> String {
    BackendKind::available()
        .first()
        .copied()
        .unwrap_or("microlp")
        .to_string()
}

fn default_time_limit() -> f64 {
    600.0
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Flag values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub identity: Option<String>,
    pub formulations: Vec<String>,
    pub dfj_max_nodes: Option<usize>,
    pub backend: Option<String>,
    pub time_limit: Option<f64>,
    pub results_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading experiment config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("parsing experiment config {}", path.display()))
    }

    /// The file at `path` when given, the defaults otherwise, with flags applied.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(identity) = overrides.identity {
            self.identity = identity;
        }
        if !overrides.formulations.is_empty() {
            self.formulations = overrides.formulations;
        }
        if let Some(cap) = overrides.dfj_max_nodes {
            self.dfj_max_nodes = cap;
        }
        if let Some(backend) = overrides.backend {
            self.solver.backend = backend;
        }
        if let Some(limit) = overrides.time_limit {
            self.solver.time_limit = limit;
        }
        if let Some(dir) = overrides.results_dir {
            self.output.results_dir = dir;
        }
        if let Some(dir) = overrides.log_dir {
            self.output.log_dir = dir;
        }
    }

    /// Selected formulations in run order, without repeats.
    pub fn formulation_kinds(&self) -> Result<Vec<FormulationKind>> {
        if self.formulations.is_empty() {
            return Ok(FormulationKind::ALL.to_vec());
        }
        let mut kinds = Vec::new();
        for name in &self.formulations {
            let kind: FormulationKind = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    pub fn backend_kind(&self) -> Result<BackendKind> {
        Ok(self.solver.backend.parse()?)
    }

    pub fn session_config(&self, log_file: PathBuf) -> SessionConfig {
        SessionConfig::new(self.identity.clone(), self.solver.time_limit).with_log_file(log_file)
    }
}
