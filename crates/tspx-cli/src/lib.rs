pub mod cli;
pub mod config;

pub use cli::{build_cli_command, Cli, Commands, LogKind, OutputFormat};
pub use config::{ExperimentConfig, Overrides};
