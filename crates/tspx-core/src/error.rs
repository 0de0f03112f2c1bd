//! Unified error types for instance handling
//!
//! [`TspError`] covers everything that can go wrong before a model is built:
//! reading files, parsing instance text and validating node/weight data.
//! Formulation and solver errors live in `tspx-algo`.

use thiserror::Error;

/// Error type for instance construction, parsing and validation.
#[derive(Error, Debug)]
pub enum TspError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result record could not be read or written as CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Instance or record text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Structurally valid data that breaks an instance invariant
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for Results using TspError.
pub type TspResult<T> = Result<T, TspError>;
