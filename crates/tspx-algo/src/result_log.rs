//! Append-only result logs.
//!
//! Each solve appends one line to the integer log and one to the relaxed log.
//! A line is written with a single `write_all` on an append-mode handle, so
//! concurrent writers never interleave within a line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tspx_core::{IntegerRecord, RelaxedRecord};

use crate::error::{FormulationError, FormulationResult};

/// Paths of the two shared result logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLog {
    integer_path: PathBuf,
    relaxed_path: PathBuf,
}

impl ResultLog {
    pub fn new(integer_path: impl Into<PathBuf>, relaxed_path: impl Into<PathBuf>) -> Self {
        Self {
            integer_path: integer_path.into(),
            relaxed_path: relaxed_path.into(),
        }
    }

    /// `results_no_relaxed.txt` and `results_relaxed.txt` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join("results_no_relaxed.txt"),
            dir.join("results_relaxed.txt"),
        )
    }

    pub fn integer_path(&self) -> &Path {
        &self.integer_path
    }

    pub fn relaxed_path(&self) -> &Path {
        &self.relaxed_path
    }

    pub fn append_integer(&self, record: &IntegerRecord) -> FormulationResult<()> {
        let line = record.to_line().map_err(FormulationError::Record)?;
        append_line(&self.integer_path, &line)
    }

    pub fn append_relaxed(&self, record: &RelaxedRecord) -> FormulationResult<()> {
        let line = record.to_line().map_err(FormulationError::Record)?;
        append_line(&self.relaxed_path, &line)
    }
}

fn append_line(path: &Path, line: &str) -> FormulationResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{line}\n").as_bytes())?;
    Ok(())
}

/// `<log_dir>/<formulation>/<instance>.log`, creating the directory.
pub fn run_log_path(
    log_dir: impl AsRef<Path>,
    formulation: &str,
    instance: &str,
) -> FormulationResult<PathBuf> {
    let dir = log_dir.as_ref().join(formulation);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("{instance}.log")))
}
