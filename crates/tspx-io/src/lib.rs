//! # tspx-io: instance files and result logs
//!
//! File formats around the formulation workbench.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tspx_io::{generate_tsp_file, parse_tsplib_file, GeneratorConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = GeneratorConfig::default().with_seed(1);
//!     let path = Path::new("instances/10_1.tsp");
//!     generate_tsp_file(path, 10, &config, &mut config.rng())?;
//!
//!     let instance = parse_tsplib_file(path)?;
//!     println!("{} nodes", instance.node_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`tsplib`] - TSPLIB 95 reader and writer
//! - [`generate`] - random `GEO` instances
//! - [`results`] - reading result logs, per-formulation averages and
//!   comparison points

pub mod generate;
pub mod results;
pub mod tsplib;

pub use generate::{generate_tsp_file, random_instance, GeneratorConfig};
pub use results::{
    average_runtime, comparison_points, read_integer_records, read_relaxed_records,
    records_by_formulation, summarize, ComparisonPoint, Metric, ResultRow, SummaryRow,
};
pub use tsplib::{parse_tsplib_file, parse_tsplib_str, write_tsplib, write_tsplib_file};
